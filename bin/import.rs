use clap::{Arg, Command};
use listing_import::{check_upload, run_import, ImportResponse, JsonLinesGateway, UploadMeta};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = Command::new("import")
        .arg(
            Arg::new("path")
                .long("path")
                .help("CSV file to import (.csv, .csv.gz, .csv.zst)")
                .value_parser(clap::value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("caller")
                .long("caller")
                .help("Caller identity stamped onto every record")
                .default_value("cli"),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .help("JSON-lines file the stored listings are appended to")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("imported.jsonl"),
        )
        .arg(
            Arg::new("content_type")
                .long("content-type")
                .help("Content type of the upload, e.g. \"text/csv; charset=windows-1252\"")
                .default_value("text/csv"),
        )
        .get_matches();

    let path = matches.get_one::<PathBuf>("path").unwrap();
    let caller = matches.get_one::<String>("caller").unwrap();
    let out = matches.get_one::<PathBuf>("out").unwrap();
    let content_type = matches.get_one::<String>("content_type").unwrap();

    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let bytes = tokio::fs::read(path).await?;
    let meta = UploadMeta::from_content_type(content_type)?.with_name_hint(name);

    let response = match check_upload(&meta, bytes.len()) {
        Err(err) => ImportResponse::from(err),
        Ok(()) => {
            let gateway = JsonLinesGateway::new(out.clone());
            match run_import(bytes, &meta, caller, &gateway).await {
                Ok(report) => ImportResponse::completed(report),
                Err(err) => ImportResponse::from(err),
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
