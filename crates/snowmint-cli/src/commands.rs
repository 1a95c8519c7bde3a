use std::io::{self, BufWriter, Write};

use anyhow::Context;
use serde::Serialize;
use snowmint::{Sid, SnowflakeGenerator, SnowflakeId};

use crate::config::{CliConfig, discover_machine_id};

/// Generates `count` IDs across `threads` threads sharing one generator and
/// writes them to `out` in ascending order.
pub fn generate(
    config: &CliConfig,
    count: usize,
    threads: usize,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let generator = SnowflakeGenerator::new(config.epoch_config()?)?
        .with_wait_strategy(config.wait);

    tracing::info!(
        count,
        threads,
        machine_id = generator.config().machine_id(),
        "generating ids"
    );

    let per_thread = count / threads;
    let remainder = count % threads;
    let mut ids = std::thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|i| {
                let n = per_thread + usize::from(i < remainder);
                let generator = &generator;
                s.spawn(move || {
                    (0..n)
                        .map(|_| generator.try_next_id())
                        .collect::<Result<Vec<SnowflakeId>, _>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .map_err(|_| anyhow::anyhow!("generator thread panicked"))?
                    .map_err(anyhow::Error::from)
            })
            .collect::<anyhow::Result<Vec<_>>>()
    })?
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();

    ids.sort_unstable();
    for id in ids {
        writeln!(out, "{id}")?;
    }
    Ok(())
}

/// One line of `snowmint parse` output.
#[derive(Debug, Serialize)]
struct ParsedId {
    #[serde(flatten)]
    sid: Sid,
    generated_at_ms: u64,
    valid: bool,
}

/// Decodes each ID and writes one JSON object per line.
pub fn parse(config: &CliConfig, ids: &[String], out: &mut impl Write) -> anyhow::Result<()> {
    let epoch = snowmint::EpochConfig::new(config.start_epoch, 0);

    for raw in ids {
        let id: u64 = raw
            .trim()
            .parse()
            .with_context(|| format!("invalid id {raw:?}"))?;
        let sid = Sid::from(id);
        let record = ParsedId {
            generated_at_ms: epoch.absolute_millis(&sid),
            valid: SnowflakeId::from_raw(id).is_valid(),
            sid,
        };
        serde_json::to_writer(&mut *out, &record)?;
        writeln!(out)?;
    }
    Ok(())
}

pub fn machine_id(out: &mut impl Write) -> anyhow::Result<()> {
    writeln!(out, "{}", discover_machine_id()?)?;
    Ok(())
}

pub fn stdout() -> BufWriter<io::StdoutLock<'static>> {
    BufWriter::new(io::stdout().lock())
}
