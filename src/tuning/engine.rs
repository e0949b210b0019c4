//! Parameter façade
//!
//! [`Tuner`] classifies a parameter name and runs the matching kind's
//! inspect, optimise and apply steps against its [`Host`].

use super::{block, cpu, grub, limits, login, memory, pagecache, rpm, service, sysctl, vm};
use crate::config::PagecacheConfig;
use crate::error::{Result, TuneError};
use crate::param::{Compliance, ParamKind, Parameter, Recommendation, Value};
use crate::system::{Host, MemoryTotals};
use serde::{Deserialize, Serialize};

/// Everything optimisation needs to know about the system, captured
/// before any parameter is reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptimiseContext {
    /// Memory totals
    pub memory: MemoryTotals,
    /// Pagecache configuration, updated as pagecache parameters resolve
    pub pagecache: PagecacheConfig,
    /// Share of total memory for /dev/shm (0 = default)
    pub tmpfs_percent: u64,
}

impl OptimiseContext {
    /// Copy with a tmpfs percentage
    pub fn with_tmpfs_percent(mut self, percent: u64) -> Self {
        self.tmpfs_percent = percent;
        self
    }
}

/// Result of optimising one parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optimised {
    /// Parameter carrying the resolved value
    pub parameter: Parameter,
    /// New pagecache configuration, if this parameter changed it
    pub pagecache: Option<PagecacheConfig>,
}

/// What [`Tuner::run_note`] does after optimising
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Inspect and optimise only
    Verify,
    /// Also write non-compliant values
    Apply,
}

/// Outcome for one parameter of a note run
#[derive(Debug)]
pub struct ParamReport {
    /// Parameter name (after expansion)
    pub name: String,
    /// Reconciled parameter, or the error that stopped it
    pub outcome: Result<Parameter>,
}

/// Parameter engine bound to a host
#[derive(Debug)]
pub struct Tuner<H: Host> {
    host: H,
}

impl<H: Host> Tuner<H> {
    /// Create a tuner for a host
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// The host being tuned
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Capture the optimisation context
    pub fn context(&self, pagecache: PagecacheConfig) -> Result<OptimiseContext> {
        Ok(OptimiseContext {
            memory: MemoryTotals::read(&self.host)?,
            pagecache,
            tmpfs_percent: 0,
        })
    }

    /// Expand bare block device names to one name per device
    pub fn expand(&self, name: &str) -> Result<Vec<String>> {
        match ParamKind::classify(name) {
            ParamKind::IoScheduler | ParamKind::NrRequests => block::expand(&self.host, name),
            _ => Ok(vec![name.to_string()]),
        }
    }

    /// Read the live value of a parameter
    pub fn inspect(&self, name: &str) -> Result<Parameter> {
        let host: &dyn Host = &self.host;
        let param = Parameter::new(name);
        let current = match param.kind() {
            ParamKind::Sysctl => sysctl::inspect(host, name)?,
            ParamKind::IoScheduler => {
                let Some(dev) = block::device_of(name) else {
                    return Ok(param);
                };
                let (current, choices) = block::inspect_scheduler(host, dev)?;
                return Ok(param.with_current(current).with_choices(choices));
            }
            ParamKind::NrRequests => match block::device_of(name) {
                Some(dev) => block::inspect_nr_requests(host, dev)?,
                None => Value::Na,
            },
            ParamKind::Vm => vm::inspect(host, name)?,
            ParamKind::Cpu => cpu::inspect(host, name)?,
            ParamKind::Memory => memory::inspect(host, name)?,
            ParamKind::Pagecache => pagecache::inspect(host, name)?,
            ParamKind::Service => service::inspect(host, name)?,
            ParamKind::Limits => limits::inspect(host, name)?,
            ParamKind::Login => login::inspect(host, name)?,
            ParamKind::Rpm => rpm::inspect(host, name)?,
            ParamKind::Grub => grub::inspect(host, name)?,
            ParamKind::Unknown => {
                tracing::debug!("{}: unknown parameter", name);
                Value::Na
            }
        };
        tracing::debug!("{}: current '{}'", name, current);
        Ok(param.with_current(current))
    }

    /// Reconcile a parameter with a recommendation. Never touches the host.
    pub fn optimise(
        &self,
        param: &Parameter,
        recommendation: &Recommendation,
        ctx: &OptimiseContext,
    ) -> Optimised {
        let name = param.name();
        let current = param.current();

        if recommendation.is_untouched() {
            tracing::debug!("{}: left untouched by override", name);
            return Optimised {
                parameter: param.resolve(recommendation, current.clone(), true),
                pagecache: None,
            };
        }

        let wanted = recommendation.effective();
        let mut supported = true;
        let mut updated = None;
        let resolved = match param.kind() {
            ParamKind::Sysctl => sysctl::optimise(current, wanted),
            ParamKind::IoScheduler => {
                let (value, ok) = block::optimise_scheduler(current, wanted, param.choices());
                supported = ok;
                value
            }
            ParamKind::NrRequests => block::optimise_nr_requests(current, wanted),
            ParamKind::Vm => vm::optimise(name, current, wanted),
            ParamKind::Cpu => cpu::optimise(name, current, wanted),
            ParamKind::Memory => memory::optimise(name, current, wanted, ctx),
            ParamKind::Pagecache => {
                let (value, config) =
                    pagecache::optimise(name, current, wanted, &ctx.pagecache, &ctx.memory);
                updated = config;
                value
            }
            ParamKind::Service => service::optimise(name, current, wanted),
            ParamKind::Limits => limits::optimise(current, wanted),
            ParamKind::Login => login::optimise(current, wanted),
            ParamKind::Rpm | ParamKind::Grub | ParamKind::Unknown => wanted.clone(),
        };

        tracing::debug!(
            "{}: current '{}' recommended '{}' {} resolved '{}'",
            name,
            current,
            wanted,
            recommendation.operator,
            resolved
        );
        Optimised {
            parameter: param.resolve(recommendation, resolved, supported),
            pagecache: updated,
        }
    }

    /// Write a value. With `revert` set the value is a previously captured
    /// one; reverting something that no longer exists is not an error.
    pub fn apply(&self, name: &str, value: &Value, revert: bool) -> Result<()> {
        let result = self.write(name, value);
        match result {
            Err(e) if revert && e.is_absent() => {
                tracing::warn!("{}: nothing to revert ({})", name, e);
                Ok(())
            }
            other => other.map_err(|e| e.with_context(format!("cannot apply {}", name))),
        }
    }

    fn write(&self, name: &str, value: &Value) -> Result<()> {
        let host: &dyn Host = &self.host;
        let kind = ParamKind::classify(name);

        // limits and login remove their drop-in for NA
        match kind {
            ParamKind::Limits => return limits::apply(host, name, value),
            ParamKind::Login => return login::apply(host, name, value),
            _ => {}
        }

        let text = match value {
            Value::Na => {
                tracing::debug!("{}: NA, nothing to apply", name);
                return Ok(());
            }
            Value::Text(s) if s.trim().is_empty() && kind != ParamKind::Pagecache => {
                tracing::debug!("{}: empty value, nothing to apply", name);
                return Ok(());
            }
            Value::Text(s) => s.as_str(),
        };

        match kind {
            ParamKind::Sysctl => sysctl::write(host, name, text),
            ParamKind::IoScheduler | ParamKind::NrRequests => {
                let dev = block::device_of(name).ok_or_else(|| {
                    TuneError::not_supported(name, "no device given, expand the name first")
                })?;
                if kind == ParamKind::IoScheduler {
                    block::apply_scheduler(host, name, dev, text)
                } else {
                    block::apply_nr_requests(host, name, dev, text)
                }
            }
            ParamKind::Vm => vm::apply(host, name, text),
            ParamKind::Cpu => cpu::apply(host, name, text),
            ParamKind::Memory => memory::apply(host, name, text),
            ParamKind::Pagecache => pagecache::apply(host, name, text),
            ParamKind::Service => service::apply(host, name, text),
            ParamKind::Rpm | ParamKind::Grub | ParamKind::Unknown => {
                tracing::info!("{}: report only, not changed", name);
                Ok(())
            }
            ParamKind::Limits | ParamKind::Login => Ok(()),
        }
    }

    /// Run a list of recommendations: expand, inspect, optimise and, in
    /// [`RunMode::Apply`], write what is not yet compliant.
    ///
    /// A `VSZ_TMPFS_PERCENT` entry sets the shm percentage for the whole
    /// note before anything is resolved. A failing parameter does not stop
    /// the run. Returns the context as updated by pagecache and tmpfs
    /// parameters.
    pub fn run_note(
        &self,
        entries: &[(String, Recommendation)],
        ctx: OptimiseContext,
        mode: RunMode,
    ) -> (OptimiseContext, Vec<ParamReport>) {
        let mut ctx = ctx;
        if let Some(percent) = tmpfs_percent_of(entries) {
            ctx.tmpfs_percent = percent;
        }
        let mut reports = Vec::new();

        for (name, recommendation) in entries {
            let names = match self.expand(name) {
                Ok(names) => names,
                Err(e) => {
                    reports.push(ParamReport {
                        name: name.clone(),
                        outcome: Err(e),
                    });
                    continue;
                }
            };
            for expanded in names {
                let outcome = self.run_one(&expanded, recommendation, &mut ctx, mode);
                if let Err(e) = &outcome {
                    tracing::warn!("{}: {}", expanded, e);
                }
                reports.push(ParamReport {
                    name: expanded,
                    outcome,
                });
            }
        }
        (ctx, reports)
    }

    fn run_one(
        &self,
        name: &str,
        recommendation: &Recommendation,
        ctx: &mut OptimiseContext,
        mode: RunMode,
    ) -> Result<Parameter> {
        let param = self.inspect(name)?;
        let optimised = self.optimise(&param, recommendation, ctx);
        if let Some(config) = optimised.pagecache {
            ctx.pagecache = config;
        }
        let parameter = optimised.parameter;

        if mode == RunMode::Apply
            && parameter.is_applicable()
            && parameter.compliance() != Compliance::Compliant
        {
            if let Some(value) = parameter.resolved() {
                self.apply(name, value, false)?;
            }
        }
        Ok(parameter)
    }
}

/// `VSZ_TMPFS_PERCENT` of a note, wherever it appears in the list
fn tmpfs_percent_of(entries: &[(String, Recommendation)]) -> Option<u64> {
    entries
        .iter()
        .filter(|(name, rec)| name == "VSZ_TMPFS_PERCENT" && !rec.is_untouched())
        .filter_map(|(_, rec)| rec.effective().as_text()?.trim().parse::<u64>().ok())
        .last()
}
