mod classpath;
mod config;
mod executor;
mod runtime;

pub use classpath::{build_classpath, get_classpath_separator};
pub use config::ApplicationLaunchConfiguration;
pub use executor::ProcessExecutor;
pub use runtime::{RuntimeDescriptor, DEFAULT_PROBE_TIMEOUT};

#[cfg(all(test, unix))]
pub(crate) use runtime::tests::script as test_script;
