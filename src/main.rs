use std::io::Write;

use log::error;

use battctl::modbus::frame::ExceptionCode;
use battctl::options::Options;
use battctl::storage::Side;
use battctl::Error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f"),
                record.level(),
                record.module_path().unwrap_or(""),
                record.args()
            )
        })
        .write_style(env_logger::WriteStyle::Never)
        .init();

    let options = Options::new();

    match battctl::run(&options) {
        Ok(limits) => {
            println!(
                "Charge limit {}% is {}",
                limits.percent(Side::Charge),
                state(limits.enabled(Side::Charge))
            );
            println!(
                "Discharge limit {}% is {}",
                limits.percent(Side::Discharge),
                state(limits.enabled(Side::Discharge))
            );
        }
        Err(Error::Exception(ExceptionCode::ServerDeviceFailure)) => {
            error!("device refused the request: check that inverter control via Modbus is enabled on the device");
            std::process::exit(1);
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn state(enabled: bool) -> &'static str {
    if enabled {
        "enabled"
    } else {
        "disabled"
    }
}
