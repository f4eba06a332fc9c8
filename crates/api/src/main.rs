#![forbid(unsafe_code)]

use lt_api::{ApiRequest, ApiServer, error_response};
use std::fmt::Write as _;
use std::io::{BufRead, Write};
use std::path::PathBuf;

const SERVER_NAME: &str = "lotrace-api";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn write_last_crash(storage_dir: &std::path::Path, detail: &str) {
    // Best-effort crash report; never logs request bodies.
    let _ = std::fs::create_dir_all(storage_dir);
    let path = storage_dir.join("lotrace_api_last_crash.txt");

    let mut out = String::new();
    let _ = writeln!(out, "pid={}", std::process::id());
    let _ = writeln!(out, "version={SERVER_VERSION}");
    let _ = writeln!(out, "args={:?}", std::env::args().collect::<Vec<_>>());
    let _ = writeln!(out, "detail={detail}");
    let _ = std::fs::write(path, out);
}

fn install_crash_reporter(storage_dir: PathBuf) {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let mut detail = info.to_string();
        let backtrace = std::backtrace::Backtrace::force_capture();
        let _ = write!(&mut detail, "\nbacktrace:\n{backtrace}");
        write_last_crash(&storage_dir, &detail);
        default_hook(info);
    }));
}

fn print_help() {
    println!("{SERVER_NAME} {SERVER_VERSION}");
    println!();
    println!("USAGE:");
    println!("  lt_api [--storage-dir <path>]");
    println!();
    println!("Reads one JSON request per line on stdin and writes one JSON");
    println!("response per line on stdout.");
}

fn main() {
    let mut storage_dir = PathBuf::from("lotrace_data");
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--storage-dir" => {
                let Some(value) = args.next() else {
                    eprintln!("--storage-dir requires a path");
                    std::process::exit(2);
                };
                storage_dir = PathBuf::from(value);
            }
            "--help" | "-h" => {
                print_help();
                return;
            }
            "--version" | "-V" => {
                println!("{SERVER_NAME} {SERVER_VERSION}");
                return;
            }
            unknown => {
                eprintln!("unknown argument: {unknown}");
                std::process::exit(2);
            }
        }
    }

    install_crash_reporter(storage_dir.clone());

    let store = match lt_storage::SqliteStore::open(&storage_dir) {
        Ok(store) => store,
        Err(err) => {
            write_last_crash(&storage_dir, &format!("open store: {err}"));
            eprintln!("cannot open storage at {}: {err}", storage_dir.display());
            std::process::exit(1);
        }
    };
    let mut server = ApiServer::new(store);

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout().lock();
    let mut line = String::new();
    loop {
        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(err) => {
                write_last_crash(&storage_dir, &format!("stdin: {err}"));
                break;
            }
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<ApiRequest>(trimmed) {
            Ok(request) => server.handle(request),
            Err(err) => error_response(None, "INVALID_INPUT", &format!("bad request: {err}")),
        };
        if writeln!(stdout, "{reply}").and_then(|()| stdout.flush()).is_err() {
            break;
        }
    }
}
