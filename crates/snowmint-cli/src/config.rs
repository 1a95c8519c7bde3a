use core::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use snowmint::{DEFAULT_EPOCH, EpochConfig, MAX_MACHINE_ID, WaitStrategy};

/// Command line arguments for the `snowmint` binary.
///
/// Every global option can also be set through its environment variable or a
/// `.env` file in the working directory.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "snowmint",
    version,
    about = "Generate and decode time-ordered 64-bit IDs"
)]
pub struct CliArgs {
    /// Start epoch in milliseconds since 1970-01-01 UTC.
    ///
    /// Must not lie in the future. IDs decoded with a different epoch than
    /// they were generated with report a wrong generation time.
    ///
    /// Environment variable: `SNOWMINT_EPOCH_MS`
    #[arg(long, global = true, env = "SNOWMINT_EPOCH_MS", default_value_t = DEFAULT_EPOCH.as_millis() as u64)]
    pub epoch_ms: u64,

    /// Machine ID stamped into generated IDs (0..=63).
    ///
    /// Environment variable: `SNOWMINT_MACHINE_ID`
    #[arg(long, global = true, env = "SNOWMINT_MACHINE_ID", conflicts_with = "auto_machine_id")]
    pub machine_id: Option<u64>,

    /// Derive the machine ID from the last octet of the host's first private
    /// IPv4 address, reduced into the machine ID range.
    ///
    /// Environment variable: `SNOWMINT_AUTO_MACHINE_ID`
    #[arg(long, global = true, env = "SNOWMINT_AUTO_MACHINE_ID", default_value_t = false)]
    pub auto_machine_id: bool,

    /// How to wait when a millisecond's sequence space is exhausted.
    ///
    /// Environment variable: `SNOWMINT_WAIT`
    #[arg(long, global = true, env = "SNOWMINT_WAIT", value_enum, default_value_t = WaitArg::Spin)]
    pub wait: WaitArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print newly generated IDs, one per line, in ascending order.
    Generate {
        /// Number of IDs to generate.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Number of threads sharing one generator.
        #[arg(short, long, default_value_t = 1)]
        threads: usize,
    },

    /// Decode IDs into their fields and generation time, one JSON object per
    /// line.
    Parse {
        /// Decimal IDs to decode.
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Print the machine ID derived from the host's private IPv4 address.
    MachineId,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitArg {
    Spin,
    Yield,
}

impl From<WaitArg> for WaitStrategy {
    fn from(arg: WaitArg) -> Self {
        match arg {
            WaitArg::Spin => Self::Spin,
            WaitArg::Yield => Self::Yield,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineIdSource {
    Fixed(u64),
    PrivateIpv4,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub start_epoch: Duration,
    pub machine_id: MachineIdSource,
    pub wait: WaitStrategy,
    pub command: Command,
}

impl TryFrom<CliArgs> for CliConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.epoch_ms == 0 {
            bail!("SNOWMINT_EPOCH_MS must be greater than 0");
        }

        let machine_id = match (args.machine_id, args.auto_machine_id) {
            (_, true) => MachineIdSource::PrivateIpv4,
            (Some(id), false) if id > MAX_MACHINE_ID => bail!(
                "SNOWMINT_MACHINE_ID ({}) exceeds the machine ID space (max = {})",
                id,
                MAX_MACHINE_ID
            ),
            (id, false) => MachineIdSource::Fixed(id.unwrap_or(0)),
        };

        if let Command::Generate { threads, .. } = args.command {
            if threads == 0 {
                bail!("--threads must be greater than 0");
            }
        }

        Ok(Self {
            start_epoch: Duration::from_millis(args.epoch_ms),
            machine_id,
            wait: args.wait.into(),
            command: args.command,
        })
    }
}

impl CliConfig {
    /// Resolves the machine ID and builds the generator configuration.
    pub fn epoch_config(&self) -> anyhow::Result<EpochConfig> {
        let machine_id = match self.machine_id {
            MachineIdSource::Fixed(id) => id,
            MachineIdSource::PrivateIpv4 => discover_machine_id()?,
        };
        Ok(EpochConfig::new(self.start_epoch, machine_id))
    }
}

/// Reduces the last octet of the host's private IPv4 address into the machine
/// ID range.
pub fn discover_machine_id() -> anyhow::Result<u64> {
    let octet = snowmint::machine::private_ipv4_machine_id()
        .context("no private, non-loopback IPv4 address found")?;
    Ok(u64::from(octet) % (MAX_MACHINE_ID + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<CliConfig> {
        let args = CliArgs::try_parse_from(args)?;
        CliConfig::try_from(args)
    }

    #[test]
    fn defaults() {
        let config = parse(&["snowmint", "generate"]).unwrap();
        assert_eq!(config.start_epoch, DEFAULT_EPOCH);
        assert_eq!(config.machine_id, MachineIdSource::Fixed(0));
        assert_eq!(config.wait, WaitStrategy::Spin);
        assert_eq!(
            config.command,
            Command::Generate {
                count: 1,
                threads: 1
            }
        );
    }

    #[test]
    fn global_options_after_subcommand() {
        let config = parse(&[
            "snowmint",
            "generate",
            "-n",
            "10",
            "--machine-id",
            "63",
            "--epoch-ms",
            "1600000000000",
            "--wait",
            "yield",
        ])
        .unwrap();
        assert_eq!(config.machine_id, MachineIdSource::Fixed(63));
        assert_eq!(config.start_epoch, Duration::from_millis(1_600_000_000_000));
        assert_eq!(config.wait, WaitStrategy::Yield);
        assert_eq!(
            config.epoch_config().unwrap(),
            EpochConfig::new(Duration::from_millis(1_600_000_000_000), 63)
        );
    }

    #[test]
    fn rejects_machine_id_out_of_range() {
        let err = parse(&["snowmint", "--machine-id", "64", "generate"]).unwrap_err();
        assert!(err.to_string().contains("exceeds the machine ID space"));
    }

    #[test]
    fn rejects_zero_epoch_and_threads() {
        assert!(parse(&["snowmint", "--epoch-ms", "0", "generate"]).is_err());
        assert!(parse(&["snowmint", "generate", "--threads", "0"]).is_err());
    }

    #[test]
    fn auto_machine_id_conflicts_with_explicit_id() {
        assert!(
            CliArgs::try_parse_from([
                "snowmint",
                "--auto-machine-id",
                "--machine-id",
                "1",
                "machine-id"
            ])
            .is_err()
        );

        let config = parse(&["snowmint", "--auto-machine-id", "machine-id"]).unwrap();
        assert_eq!(config.machine_id, MachineIdSource::PrivateIpv4);
        assert_eq!(config.command, Command::MachineId);
    }

    #[test]
    fn parse_requires_ids() {
        assert!(CliArgs::try_parse_from(["snowmint", "parse"]).is_err());

        let config = parse(&["snowmint", "parse", "4096", "65"]).unwrap();
        assert_eq!(
            config.command,
            Command::Parse {
                ids: vec!["4096".to_owned(), "65".to_owned()]
            }
        );
    }
}
