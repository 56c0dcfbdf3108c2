use clap::{Arg, Command};
use std::io::{self, Write};

fn main() -> anyhow::Result<()> {
    let matches = Command::new("gen")
        .arg(
            Arg::new("rows")
                .long("rows")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("invalid_every")
                .long("invalid-every")
                .help("Make every Nth row fail validation (0 = all valid)")
                .value_parser(clap::value_parser!(u64))
                .default_value("0"),
        )
        .arg(Arg::new("project").long("project").default_value("proj-1"))
        .get_matches();

    let rows: u64 = *matches.get_one("rows").unwrap();
    let invalid_every: u64 = *matches.get_one("invalid_every").unwrap();
    let project = matches.get_one::<String>("project").unwrap();

    let mut out = io::BufWriter::new(io::stdout().lock());
    writeln!(&mut out, "title,price,projectId")?;

    // Deterministic data so runs are comparable; invalid rows alternate
    // between a blank title and a negative price.
    for i in 0..rows {
        let n = i + 1;
        let price = 100_000 + n;
        if invalid_every > 0 && n % invalid_every == 0 {
            if n % (invalid_every * 2) == 0 {
                writeln!(&mut out, "Listing {n},-1,{project}")?;
            } else {
                writeln!(&mut out, ",{price},{project}")?;
            }
        } else {
            writeln!(&mut out, "Listing {n},{price},{project}")?;
        }
        if i % 10_000 == 0 {
            out.flush()?;
        } // keep buffers moving on huge runs
    }

    out.flush()?;
    Ok(())
}
