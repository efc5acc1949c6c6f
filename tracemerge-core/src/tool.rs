use log::info;
use std::{io::Write, sync::Once};

/// Default number of written rows between two progress messages.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000_000;

/// Init log. Set log format.
///
/// `RUST_LOG` still overrides the default `Info` level.
pub fn init_log() {
    let mut builder = env_logger::builder();

    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}:{} - {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info);

    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder.init();
}

static INIT_LOG: Once = Once::new();

/// Setup.
pub fn setup_log() {
    INIT_LOG.call_once(|| {
        init_log();
        info!("log initialized");
    });
}

#[macro_export]
macro_rules! error_bail {
    ($msg:literal $(,)?) => {
        $crate::__log::error!($msg);
        $crate::__anyhow::bail!($msg)
    };
    ($err:expr $(,)?) => {
        $crate::__log::error!("{}", $err);
        $crate::__anyhow::bail!($err)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::__log::error!($fmt, $($arg)*);
        $crate::__anyhow::bail!($fmt, $($arg)*)
    };
}
