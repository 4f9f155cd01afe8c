use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a decimal or `0x`-prefixed hexadecimal seed.
pub fn parse_seed(token: &str) -> Result<u64> {
    let token = token.trim().replace('_', "");
    let parsed = if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        u64::from_str_radix(hex, 16)
    } else {
        token.parse::<u64>()
    };
    parsed.with_context(|| format!("invalid seed '{token}'"))
}

/// Resolve a comma-separated seed list.
pub fn resolve_seeds(tokens: &str) -> Result<Vec<u64>> {
    let seeds = split_csv(tokens)
        .iter()
        .map(|token| parse_seed(token))
        .collect::<Result<Vec<_>>>()?;
    if seeds.is_empty() {
        bail!("at least one seed is required");
    }
    Ok(seeds)
}

/// Report sink: stdout unless a path was given.
pub enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    pub fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    pub fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
