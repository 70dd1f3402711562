//! # cpu-dispatch-check
//!
//! Verifies the CPU dispatch configuration a CMake project reports for
//! several architectures.
//!
//! Each case wipes a build directory, runs the configure step for one target
//! with a set of `-D` flags, extracts the baseline / requested / disabled /
//! dispatched feature lists and compares them with a literal expectation.
//!
//! ## Supported targets
//!
//! | Target   | Toolchain file                                  |
//! |----------|-------------------------------------------------|
//! | x86_64   | none (native)                                   |
//! | aarch64  | `platforms/linux/aarch64-gnu.toolchain.cmake`   |
//! | arm      | `platforms/linux/arm-gnueabi.toolchain.cmake`   |
//! | riscv64  | `platforms/linux/riscv64-gcc.toolchain.cmake`   |
//!
//! ## Example
//!
//! ```no_run
//! use cpu_dispatch_check::{suite, Harness, HarnessConfig};
//!
//! let cfg = HarnessConfig::from_env()?;
//! let harness = Harness::new(cfg)?;
//! let report = harness.run_all(&suite::builtin_cases());
//! print!("{report}");
//! # Ok::<(), cpu_dispatch_check::HarnessError>(())
//! ```

pub mod compare;
pub mod config;
pub mod error;
/// Console and variable-file parsers producing [`FeatureRecord`]s.
pub mod extract;
pub mod harness;
/// Building and running the configure command.
pub mod invoker;
/// The feature record data model.
pub mod record;
pub mod suite;
pub mod target;
pub mod workdir;

pub use compare::{compare, CompareMode, Mismatch};
pub use config::HarnessConfig;
pub use error::HarnessError;
pub use extract::{parse_console, parse_var_file, Extracted, OutputSource, VarNames};
pub use harness::{Harness, Outcome, Report};
pub use record::{BaselineMode, FeatureList, FeatureRecord, Requested};
pub use target::Target;
