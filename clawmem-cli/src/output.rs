//! Output formatting: every command result implements [`Output`] and the
//! global `--format` flag picks how it's rendered.

use std::io::Write;

use clap::ValueEnum;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text.
    Human,
    /// JSON, for scripting.
    Json,
    /// YAML.
    Yaml,
}

pub trait Output: Serialize {
    fn write_human<W: Write>(&self, writer: W) -> anyhow::Result<()>;

    fn write(&self, mut writer: impl Write, format: OutputFormat) -> anyhow::Result<()> {
        match format {
            OutputFormat::Human => self.write_human(writer),
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut writer, self)?;
                writeln!(writer)?;
                Ok(())
            }
            OutputFormat::Yaml => {
                serde_yaml::to_writer(&mut writer, self)?;
                Ok(())
            }
        }
    }
}
