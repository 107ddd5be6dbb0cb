use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use thingstream_click::config::{Config, ConfigLoader};
use thingstream_click::logging::init_logging;
use thingstream_click::protocol::DEFAULT_QOS;
use thingstream_click::{
    AppError, LineSource, ModemSimulator, SerialLineSource, ThingstreamClick,
};
use tracing::{error, info};

const LISTEN_IDLE: Duration = Duration::from_millis(100);

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Drive a Thingstream Click modem over its serial AT interface.",
    long_about = "Sends one AT command per invocation (after identifying the modem) and reports the result. Unsolicited +IOTRECEIVE notifications can be watched with `listen`."
)]
struct Args {
    /// Configuration file (defaults to the standard search path).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial device, overriding the configuration.
    #[arg(short, long)]
    port: Option<String>,

    /// Baud rate, overriding the configuration.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Talk to the built-in modem simulator instead of a serial device.
    #[arg(long)]
    simulate: bool,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    /// Log every command and received line.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print the modem identification line.
    Info,
    /// Create the IoT session.
    Create,
    /// Connect to the Thingstream platform.
    Connect {
        /// Request a clean session, dropping cached messages.
        #[arg(long)]
        clean: bool,
        /// Keep-alive in seconds (accepted, not yet sent to the modem).
        #[arg(long)]
        keep_alive: Option<u16>,
    },
    /// Report whether the modem is connected.
    Status,
    Disconnect,
    /// Destroy the IoT session.
    Destroy,
    /// Publish a message.
    Publish {
        topic: String,
        message: String,
        #[arg(long, default_value_t = DEFAULT_QOS, allow_negative_numbers = true)]
        qos: i8,
        /// Accepted, not yet sent to the modem.
        #[arg(long)]
        retain: bool,
    },
    /// Subscribe to a topic.
    Subscribe {
        topic: String,
        #[arg(long, default_value_t = DEFAULT_QOS, allow_negative_numbers = true)]
        qos: i8,
    },
    Unsubscribe { topic: String },
    /// Bind a pre-registered topic to a numeric alias.
    RegisterAlias { topic: String, alias: u32 },
    /// Put the modem to sleep.
    Sleep { minutes: u32 },
    /// Route modem debug output.
    Debug {
        #[arg(long)]
        mikrobus: bool,
        #[arg(long)]
        usb: bool,
    },
    /// Run the modem self-test.
    SelfTest,
    /// Power the GNSS receiver, wait, and print the telemetry line.
    Gnss {
        /// Seconds to wait for a fix (defaults to the configuration).
        #[arg(long)]
        wait: Option<u64>,
        /// Leave the receiver powered afterwards.
        #[arg(long)]
        keep_on: bool,
    },
    /// Print incoming messages for a while.
    Listen {
        #[arg(long, default_value_t = 30)]
        seconds: u64,
    },
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::Info => "info",
            Action::Create => "create",
            Action::Connect { .. } => "connect",
            Action::Status => "status",
            Action::Disconnect => "disconnect",
            Action::Destroy => "destroy",
            Action::Publish { .. } => "publish",
            Action::Subscribe { .. } => "subscribe",
            Action::Unsubscribe { .. } => "unsubscribe",
            Action::RegisterAlias { .. } => "register-alias",
            Action::Sleep { .. } => "sleep",
            Action::Debug { .. } => "debug",
            Action::SelfTest => "self-test",
            Action::Gnss { .. } => "gnss",
            Action::Listen { .. } => "listen",
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    operation: &'a str,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> Result<Config, AppError> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let mut config = loader.into_config();
    if let Some(port) = &args.port {
        config.serial.port = port.clone();
    }
    if let Some(baud) = args.baud {
        config.serial.baud = baud;
    }
    if args.verbose {
        config.logging.level = "trace".to_string();
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<(), AppError> {
    let config = load_config(&args)?;
    init_logging(&config.logging);

    if args.simulate {
        info!("Using the built-in modem simulator");
        let click = ThingstreamClick::from_config(ModemSimulator::new(), &config.driver);
        session(click, "simulator", &args, &config)
    } else {
        let source =
            SerialLineSource::new(&config.serial.port, config.serial.port_configuration());
        let click = ThingstreamClick::from_config(source, &config.driver);
        session(click, &config.serial.port, &args, &config)
    }
}

fn session<L: LineSource>(
    mut click: ThingstreamClick<L>,
    device: &str,
    args: &Args,
    config: &Config,
) -> Result<(), AppError> {
    if !click.init() {
        return Err(AppError::InitFailed {
            device: device.to_string(),
            cause: click.last_error().cloned(),
        });
    }
    let result = perform(&mut click, &args.action, config, args.json);
    click.deinit();
    result
}

fn perform<L: LineSource>(
    click: &mut ThingstreamClick<L>,
    action: &Action,
    config: &Config,
    json: bool,
) -> Result<(), AppError> {
    let operation = action.name();
    let success = match action {
        Action::Info => {
            let line = click.info();
            return print_line(click, operation, line, json);
        }
        Action::Gnss { wait, keep_on } => {
            let wait = wait.unwrap_or(config.gnss.wait_secs);
            let power_off = config.gnss.power_off_after && !keep_on;
            let fix = click.get_fix(wait, power_off);
            return print_line(click, operation, fix, json);
        }
        Action::Listen { seconds } => return listen(click, Duration::from_secs(*seconds), json),
        Action::Status => {
            let connected = click.is_connected();
            emit(
                json,
                &Report {
                    operation,
                    success: true,
                    response: Some(connected.to_string()),
                    error: None,
                },
            )?;
            return Ok(());
        }
        Action::Create => click.create(),
        Action::Connect { clean, keep_alive } => click.connect(*clean, *keep_alive),
        Action::Disconnect => click.disconnect(),
        Action::Destroy => click.destroy(),
        Action::Publish {
            topic,
            message,
            qos,
            retain,
        } => click.publish(topic, message, *qos, retain.then_some(true)),
        Action::Subscribe { topic, qos } => click.subscribe(topic, *qos),
        Action::Unsubscribe { topic } => click.unsubscribe(topic),
        Action::RegisterAlias { topic, alias } => click.register_alias(topic, *alias),
        Action::Sleep { minutes } => click.sleep(*minutes),
        Action::Debug { mikrobus, usb } => click.debug_output(*mikrobus, *usb),
        Action::SelfTest => click.self_test(),
    };

    let error = click.last_error().cloned();
    emit(
        json,
        &Report {
            operation,
            success,
            response: None,
            error: error.as_ref().map(|e| e.to_string()),
        },
    )?;
    if success {
        Ok(())
    } else {
        Err(AppError::OperationFailed {
            operation,
            cause: error,
        })
    }
}

fn print_line<L: LineSource>(
    click: &ThingstreamClick<L>,
    operation: &'static str,
    line: String,
    json: bool,
) -> Result<(), AppError> {
    let success = !line.is_empty();
    let error = click.last_error().cloned();
    emit(
        json,
        &Report {
            operation,
            success,
            response: success.then(|| line.clone()),
            error: error.as_ref().map(|e| e.to_string()),
        },
    )?;
    if success {
        Ok(())
    } else {
        Err(AppError::OperationFailed {
            operation,
            cause: error,
        })
    }
}

fn listen<L: LineSource>(
    click: &mut ThingstreamClick<L>,
    duration: Duration,
    json: bool,
) -> Result<(), AppError> {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        let polled = click.poll();
        while click.has_message() {
            let message = click.take_message();
            if json {
                println!("{}", serde_json::json!({ "message": message }));
            } else {
                println!("{message}");
            }
        }
        if click.server_disconnected() {
            info!("Server disconnected the session");
            click.acknowledge_disconnect();
        }
        if polled.is_none() {
            std::thread::sleep(LISTEN_IDLE);
        }
    }
    Ok(())
}

fn emit(json: bool, report: &Report<'_>) -> Result<(), AppError> {
    if json {
        println!("{}", serde_json::to_string(report)?);
    } else {
        match (&report.response, report.success) {
            (Some(response), _) => println!("{}: {}", report.operation, response),
            (None, true) => println!("{}: ok", report.operation),
            (None, false) => println!("{}: failed", report.operation),
        }
    }
    Ok(())
}
