//! Command-line gateway over the survey core.
//!
//! # Responsibility
//! - Translate one command line into an [`ApiRequest`] and print the response.
//! - Print the core version when invoked without a request.
//!
//! # Invariants
//! - A `?k=v&..` suffix on PATH is percent-decoded like a URL query string.
//! - Trailing `key=value` arguments are taken literally.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use url::form_urlencoded;
use wenjuan_core::api::{dispatch, ApiRequest, Method};
use wenjuan_core::{CoreConfig, DatabaseLocation, SurveyCore};

#[derive(Debug, Parser)]
#[command(name = "wenjuan_cli")]
#[command(about = "Send one request to the survey core")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database file; overrides the configured database.
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// GET, POST, PUT or DELETE. Omit to print the core version.
    #[arg(value_name = "METHOD", value_parser = parse_method, requires = "path")]
    method: Option<Method>,

    /// Route path such as `/wenjuans/search?query=Customer%20Feedback`.
    #[arg(value_name = "PATH")]
    path: Option<String>,

    /// A JSON body (`{..}` or `[..]`) and `key=value` parameters.
    #[arg(value_name = "BODY_OR_PARAM", allow_hyphen_values = true)]
    rest: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };
    let request = match build_request(&cli) {
        Ok(Some(request)) => request,
        Ok(None) => {
            println!("wenjuan_core version={}", wenjuan_core::core_version());
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    let core = match SurveyCore::open(&config) {
        Ok(core) => core,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let response = dispatch(&core, &request);
    println!("status={}", response.status);
    if let Some(file_name) = &response.file_name {
        println!("file_name={file_name}");
    }
    if !response.body.is_empty() {
        println!("{}", String::from_utf8_lossy(&response.body));
    }

    if let Err(err) = core.close() {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }
    if response.status < 400 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn parse_method(value: &str) -> Result<Method, String> {
    Method::parse(value).ok_or_else(|| format!("unsupported method `{value}`"))
}

fn load_config(cli: &Cli) -> Result<CoreConfig, String> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|err| format!("cannot read config `{}`: {err}", path.display()))?;
            CoreConfig::from_json_str(&text).map_err(|err| err.to_string())?
        }
        None => CoreConfig::default(),
    };
    if let Some(path) = &cli.db {
        config.database = DatabaseLocation::File(path.clone());
    }
    Ok(config)
}

/// `Ok(None)` when no METHOD was given.
fn build_request(cli: &Cli) -> Result<Option<ApiRequest>, String> {
    let (Some(method), Some(target)) = (cli.method, cli.path.as_deref()) else {
        return Ok(None);
    };

    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    let mut request = ApiRequest::new(method, path);
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        request = request.with_param(key, value);
    }

    for arg in &cli.rest {
        if arg.starts_with('{') || arg.starts_with('[') {
            let body = serde_json::from_str(arg).map_err(|err| format!("invalid body: {err}"))?;
            request = request.with_body(body);
        } else if let Some((key, value)) = arg.split_once('=') {
            request = request.with_param(key, value);
        } else {
            return Err(format!("unexpected argument `{arg}`"));
        }
    }

    Ok(Some(request))
}

#[cfg(test)]
mod tests {
    use super::{build_request, load_config, Cli};
    use clap::Parser;
    use serde_json::json;
    use wenjuan_core::api::Method;
    use wenjuan_core::DatabaseLocation;

    fn request_for(args: &[&str]) -> wenjuan_core::api::ApiRequest {
        let cli = Cli::try_parse_from(args).unwrap();
        build_request(&cli).unwrap().unwrap()
    }

    #[test]
    fn query_string_values_are_percent_decoded() {
        let request = request_for(&[
            "wenjuan_cli",
            "GET",
            "/wenjuans/search?query=Customer%20Feedback&limit=2",
        ]);
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/wenjuans/search");
        assert_eq!(request.params["query"], "Customer Feedback");
        assert_eq!(request.params["limit"], "2");

        let request = request_for(&["wenjuan_cli", "get", "/wenjuans/search?query=a+b%26c"]);
        assert_eq!(request.params["query"], "a b&c");
    }

    #[test]
    fn trailing_arguments_become_body_and_literal_params() {
        let request = request_for(&[
            "wenjuan_cli",
            "POST",
            "/wenjuans",
            r#"{"title":"Pulse"}"#,
            "query=50%",
        ]);
        assert_eq!(request.body, Some(json!({"title": "Pulse"})));
        assert_eq!(request.params["query"], "50%");
    }

    #[test]
    fn no_method_means_version_only() {
        let cli = Cli::try_parse_from(["wenjuan_cli"]).unwrap();
        assert!(build_request(&cli).unwrap().is_none());
    }

    #[test]
    fn rejects_unknown_method_and_missing_path() {
        assert!(Cli::try_parse_from(["wenjuan_cli", "PATCH", "/wenjuans"]).is_err());
        assert!(Cli::try_parse_from(["wenjuan_cli", "GET"]).is_err());

        let cli = Cli::try_parse_from(["wenjuan_cli", "GET", "/wenjuans", "stray"]).unwrap();
        assert!(build_request(&cli).is_err());
    }

    #[test]
    fn db_flag_overrides_configured_database() {
        let cli = Cli::try_parse_from(["wenjuan_cli", "--db", "survey.db", "GET", "/wenjuans"])
            .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(
            config.database,
            DatabaseLocation::File("survey.db".into())
        );
    }
}
