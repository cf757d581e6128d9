//! Decode a raw CIM-XML HTTP request and print what the server would do with it.
//!
//! A decoded request is printed as JSON (or `Debug`), a rejection as the raw HTTP response.
//! The process exits with 1 when the request was rejected.

use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use simplelog::{Config, WriteLogger};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::process::exit;
use std::sync::{Arc, Mutex};

use cimxml::{
    AuthInfo, CimOperationRequestDecoder, DecoderSettings, HttpMessage, HttpResponse,
    MessageQueue, QueueMessage, QueueRegistry,
};

const RESPONSE_QUEUE_ID: u32 = 1;
const REQUEST_QUEUE_ID: u32 = 2;

#[derive(Copy, Clone, PartialEq, Eq)]
enum OutputFormat {
    Json,
    Debug,
}

/// Keeps whatever the decoder hands it.
struct CaptureQueue {
    id: u32,
    messages: Mutex<Vec<QueueMessage>>,
}

impl CaptureQueue {
    fn new(id: u32) -> Arc<Self> {
        Arc::new(CaptureQueue {
            id,
            messages: Mutex::new(Vec::new()),
        })
    }

    fn take(&self) -> Vec<QueueMessage> {
        match self.messages.lock() {
            Ok(mut messages) => std::mem::take(&mut *messages),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl MessageQueue for CaptureQueue {
    fn queue_id(&self) -> u32 {
        self.id
    }

    fn enqueue(&self, message: QueueMessage) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message),
            Err(poisoned) => poisoned.into_inner().push(message),
        }
    }
}

fn command() -> Command {
    Command::new("cimxml_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Decode a raw CIM-XML operation request (request line, headers and body)")
        .arg(
            Arg::new("INPUT")
                .required(true)
                .help("File holding the raw HTTP request, or `-` for stdin"),
        )
        .arg(
            Arg::new("format")
                .short('o')
                .long("format")
                .value_parser(["json", "debug"])
                .default_value("json")
                .help("How to print a decoded request"),
        )
        .arg(
            Arg::new("output-target")
                .short('f')
                .long("output")
                .value_name("FILE")
                .help("Write output to FILE instead of stdout"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .value_name("NAME")
                .help("Authenticated user name to attach to the request"),
        )
        .arg(
            Arg::new("expired-password")
                .long("expired-password")
                .action(ArgAction::SetTrue)
                .help("Treat the caller's password as expired"),
        )
        .arg(
            Arg::new("max-elements")
                .long("max-elements")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("Maximum number of XML elements in a request body"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("Sets debug prints level for the application:\n  -v   - info\n  -vv  - debug\n  -vvv - trace"),
        )
}

fn read_input(input: &str) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    if input == "-" {
        io::stdin()
            .read_to_end(&mut bytes)
            .context("failed to read request from stdin")?;
    } else {
        bytes = fs::read(input).with_context(|| format!("failed to read `{input}`"))?;
    }
    Ok(bytes)
}

fn open_output(matches: &ArgMatches) -> Result<Box<dyn Write>> {
    match matches.get_one::<String>("output-target") {
        Some(path) => {
            if fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false) {
                bail!("output target `{path}` is a directory");
            }
            let file = File::create(path).with_context(|| format!("failed to create `{path}`"))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

fn init_logging(matches: &ArgMatches) -> Result<()> {
    let level = match matches.get_count("verbose") {
        0 => return Ok(()),
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    WriteLogger::init(level, Config::default(), io::stderr())
        .context("failed to initialize logging")
}

fn write_response(output: &mut dyn Write, response: &HttpResponse) -> Result<()> {
    output.write_all(&response.to_bytes())?;
    writeln!(output)?;
    Ok(())
}

/// Returns whether the request was accepted.
fn run(matches: &ArgMatches) -> Result<bool> {
    init_logging(matches)?;

    let input = matches
        .get_one::<String>("INPUT")
        .context("missing INPUT argument")?;
    let format = match matches.get_one::<String>("format").map(String::as_str) {
        Some("debug") => OutputFormat::Debug,
        _ => OutputFormat::Json,
    };
    let mut output = open_output(matches)?;

    let bytes = read_input(input)?;
    let message = match HttpMessage::parse(&bytes, RESPONSE_QUEUE_ID) {
        Ok(message) => message,
        Err(err) => {
            write_response(output.as_mut(), &HttpResponse::http_error(&err, true))?;
            return Ok(false);
        }
    };
    let message = message
        .with_auth(AuthInfo {
            user_name: matches.get_one::<String>("user").cloned().unwrap_or_default(),
            ..AuthInfo::default()
        })
        .with_expired_password(matches.get_flag("expired-password"));

    let mut settings = DecoderSettings::new();
    if let Some(max_elements) = matches.get_one::<usize>("max-elements") {
        settings = settings.max_elements(*max_elements);
    }

    let requests = CaptureQueue::new(REQUEST_QUEUE_ID);
    let responses = CaptureQueue::new(RESPONSE_QUEUE_ID);
    let directory = QueueRegistry::new().register(responses.clone());
    let decoder = CimOperationRequestDecoder::new(requests.clone(), Arc::new(directory), settings);

    decoder.handle_http_message(&message);

    let mut accepted = false;
    for delivered in requests.take().into_iter().chain(responses.take()) {
        match delivered {
            QueueMessage::Request(request) => {
                accepted = true;
                match format {
                    OutputFormat::Json => {
                        serde_json::to_writer_pretty(&mut output, &request)?;
                        writeln!(output)?;
                    }
                    OutputFormat::Debug => writeln!(output, "{request:#?}")?,
                }
            }
            QueueMessage::Response(response) => write_response(output.as_mut(), &response)?,
        }
    }
    output.flush()?;
    Ok(accepted)
}

fn main() {
    let matches = command().get_matches();

    match run(&matches) {
        Ok(true) => {}
        Ok(false) => exit(1),
        Err(e) => {
            eprintln!("{e:?}");
            exit(1)
        }
    }
}
