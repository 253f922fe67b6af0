//! Documentation about the various scripts contained herein
//!
//! - [check-cswch](#check-cswch)
//! - [check-intr](#check-intr)
//! - [check-load](#check-load)
//!
//! # check-cswch
//!
//! Linux-only. Reads the `ctxt` counter from /proc/stat.
//!
//! ```plain
//! $ check-cswch --help
//! check-cswch (part of kstat-plugins) 0.1.0
//! Check the number of context switches per second
//!
//! With a count of 1 the raw counter since boot is checked instead of a rate.
//!
//! USAGE:
//!     check-cswch [FLAGS] [OPTIONS] [ARGS]
//!
//! FLAGS:
//!     -h, --help
//!             Prints help information
//!
//!     -V, --version
//!             Prints version information
//!
//!     -v, --verbose
//!             Print every counter reading and log debug output
//!
//!
//! OPTIONS:
//!     -c, --critical <critical>
//!             Range of rates that is OK before going critical
//!
//!     -w, --warning <warning>
//!             Range of rates that is OK before warning, e.g. 5000 or @10:20
//!
//!
//! ARGS:
//!     <delay>
//!             Seconds to wait between samples [default: 1]
//!
//!     <count>
//!             Number of samples to take. With 1 the raw counter is reported [default: 2]
//! ```
//!
//! # check-intr
//!
//! Linux-only. Reads the `intr` counter from /proc/stat.
//!
//! ```plain
//! $ check-intr --help
//! check-intr (part of kstat-plugins) 0.1.0
//! Check the number of interrupts per second
//!
//! With a count of 1 the raw counter since boot is checked instead of a rate.
//!
//! USAGE:
//!     check-intr [FLAGS] [OPTIONS] [ARGS]
//!
//! FLAGS:
//!     -h, --help
//!             Prints help information
//!
//!     -V, --version
//!             Prints version information
//!
//!     -v, --verbose
//!             Print every counter reading and log debug output
//!
//!
//! OPTIONS:
//!     -c, --critical <critical>
//!             Range of rates that is OK before going critical
//!
//!     -w, --warning <warning>
//!             Range of rates that is OK before warning, e.g. 5000 or @10:20
//!
//!
//! ARGS:
//!     <delay>
//!             Seconds to wait between samples [default: 1]
//!
//!     <count>
//!             Number of samples to take. With 1 the raw counter is reported [default: 2]
//! ```
//!
//! # check-load
//!
//! Linux-only. Reads /proc/loadavg, and /proc/stat with `--percpu`.
//!
//! ```plain
//! $ check-load --help
//! check-load (part of kstat-plugins) 0.1.0
//! Check the load average of the system
//!
//! Load average is the number of processes *waiting* to do work in a queue, either due to IO or CPU constraints. The
//! numbers used to check are the load averaged over 1, 5 and 15 minutes, respectively.
//!
//! Only the windows selected with -1, -5 and -L affect the result; with none of them all three do. Unselected windows
//! are still reported.
//!
//! USAGE:
//!     check-load [FLAGS] [OPTIONS]
//!
//! FLAGS:
//!     -h, --help
//!             Prints help information
//!
//!     -1, --load1
//!             Check the 1 minute average
//!
//!     -L, --load15
//!             Check the 15 minute average
//!
//!     -5, --load5
//!             Check the 5 minute average
//!
//!     -r, --percpu
//!             Divide the load averages by the number of CPUs
//!
//!     -V, --version
//!             Prints version information
//!
//!     -v, --verbose
//!             Log how every window was judged
//!
//!
//! OPTIONS:
//!     -c, --critical <critical>
//!             Averages to go critical above, either one value or three comma separated ones
//!
//!     -w, --warning <warning>
//!             Averages to warn above, either one value or three comma separated ones
//! ```
