use crate::config::Config;
use crate::record::Record;
use crate::stats::{SeriesReport, TimeSeries};
use anyhow::{Context, Result};
use rmp_serde::{decode, encode};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

pub trait Obs {
    fn name(&self) -> &'static str;
    fn update(&mut self, record: &Record);
    fn report(&self) -> SeriesReport;
}

/// Fraction of vertices currently infectious.
#[derive(Default)]
pub struct InfectiousFraction {
    time_series: TimeSeries,
}

impl Obs for InfectiousFraction {
    fn name(&self) -> &'static str {
        "infectious_fraction"
    }

    fn update(&mut self, record: &Record) {
        self.time_series
            .push(record.step, record.infectious_fraction());
    }

    fn report(&self) -> SeriesReport {
        self.time_series.report()
    }
}

/// Any scalar field of a record.
pub struct Scalar {
    name: &'static str,
    extract: fn(&Record) -> Option<f64>,
    time_series: TimeSeries,
}

impl Scalar {
    pub fn new(name: &'static str, extract: fn(&Record) -> Option<f64>) -> Self {
        Self {
            name,
            extract,
            time_series: TimeSeries::default(),
        }
    }
}

impl Obs for Scalar {
    fn name(&self) -> &'static str {
        self.name
    }

    fn update(&mut self, record: &Record) {
        if let Some(val) = (self.extract)(record) {
            self.time_series.push(record.step, val);
        }
    }

    fn report(&self) -> SeriesReport {
        self.time_series.report()
    }
}

pub struct Analyzer {
    cfg: Config,
    obs_ptr_vec: Vec<Box<dyn Obs>>,
}

impl Analyzer {
    pub fn new(cfg: Config) -> Self {
        let mut obs_ptr_vec: Vec<Box<dyn Obs>> = vec![
            Box::new(InfectiousFraction::default()),
            Box::new(Scalar::new("relative_size", |rec| Some(rec.relative_size))),
            Box::new(Scalar::new("expected_infections", |rec| {
                Some(rec.expected_infections)
            })),
            Box::new(Scalar::new("social_welfare", |rec| Some(rec.social_welfare))),
        ];
        if cfg.output.probe_vertex.is_some() {
            obs_ptr_vec.push(Box::new(Scalar::new("network_effect", |rec| {
                rec.network_effect
            })));
        }
        Self { cfg, obs_ptr_vec }
    }

    pub fn add_file<P: AsRef<Path>>(&mut self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        for _ in 0..self.cfg.output.saves_per_file {
            let record: Record = decode::from_read(&mut reader).context("failed to read record")?;
            for obs in &mut self.obs_ptr_vec {
                obs.update(&record);
            }
        }
        Ok(())
    }

    pub fn reports(&self) -> BTreeMap<&'static str, SeriesReport> {
        self.obs_ptr_vec
            .iter()
            .map(|obs| (obs.name(), obs.report()))
            .collect()
    }

    pub fn save_results<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);

        encode::write_named(&mut writer, &self.reports()).context("failed to serialize results")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }
}
