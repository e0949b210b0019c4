//! Per-CPU power settings
//!
//! `energy_perf_bias` and `governor` are per-CPU files reported as an
//! instance map (`all:performance` or `cpu0:15 cpu1:6`). `force_latency`
//! is the highest exit latency a CPU may incur, enforced by disabling
//! deeper cpuidle states.

use super::{guard_na, read_trimmed, write_existing};
use crate::error::{Result, TuneError};
use crate::param::{max_of, InstanceMap, Value, ALL};
use crate::system::Host;

const CPU_DIR: &str = "/sys/devices/system/cpu";

/// Bias value for a named power profile
pub fn energy_perf_bias_of(profile: &str) -> &'static str {
    match profile.trim() {
        "performance" => "0",
        "normal" => "6",
        "powersave" => "15",
        _ => "0",
    }
}

fn file_of(name: &str) -> Option<&'static str> {
    match name {
        "energy_perf_bias" => Some("power/energy_perf_bias"),
        "governor" => Some("cpufreq/scaling_governor"),
        _ => None,
    }
}

/// Logical CPUs (`cpu0`, `cpu1`, ...) in numeric order
pub fn cpus(host: &dyn Host) -> Result<Vec<String>> {
    let mut cpus: Vec<(u32, String)> = host
        .list(CPU_DIR)?
        .into_iter()
        .filter_map(|entry| {
            let index = entry.strip_prefix("cpu")?.parse::<u32>().ok()?;
            Some((index, entry))
        })
        .collect();
    cpus.sort();
    Ok(cpus.into_iter().map(|(_, name)| name).collect())
}

/// A cpuidle state of one CPU
#[derive(Debug, Clone, PartialEq, Eq)]
struct IdleState {
    dir: String,
    latency: i64,
    disabled: bool,
}

fn idle_states(host: &dyn Host, cpu: &str) -> Result<Vec<IdleState>> {
    let base = format!("{}/{}/cpuidle", CPU_DIR, cpu);
    let mut states = Vec::new();
    for entry in host.list(&base)? {
        if !entry.starts_with("state") {
            continue;
        }
        let dir = format!("{}/{}", base, entry);
        let Some(latency) = read_trimmed(host, &format!("{}/latency", dir))? else {
            continue;
        };
        let Ok(latency) = latency.parse::<i64>() else {
            tracing::warn!("{}: unreadable latency '{}'", dir, latency);
            continue;
        };
        let disabled = read_trimmed(host, &format!("{}/disable", dir))?.as_deref() == Some("1");
        states.push(IdleState {
            dir,
            latency,
            disabled,
        });
    }
    Ok(states)
}

/// Current value of a CPU setting; NA if no CPU exposes it
pub fn inspect(host: &dyn Host, name: &str) -> Result<Value> {
    if name == "force_latency" {
        let mut latencies = Vec::new();
        let mut found = false;
        for cpu in cpus(host)? {
            for state in idle_states(host, &cpu)? {
                found = true;
                if !state.disabled {
                    latencies.push(state.latency);
                }
            }
        }
        if !found {
            return Ok(Value::Na);
        }
        return Ok(Value::Text(max_of(&latencies).to_string()));
    }

    let Some(file) = file_of(name) else {
        return Ok(Value::Na);
    };
    let mut readings = Vec::new();
    for cpu in cpus(host)? {
        if let Some(v) = read_trimmed(host, &format!("{}/{}/{}", CPU_DIR, cpu, file))? {
            readings.push((cpu, v));
        }
    }
    if readings.is_empty() {
        return Ok(Value::Na);
    }
    Ok(Value::Text(InstanceMap::from_readings(readings).to_string()))
}

/// Rewrite every instance with the recommended setting, keeping keys and
/// their order. `force_latency` takes the recommendation as is.
pub fn optimise(name: &str, current: &Value, recommended: &Value) -> Value {
    if name == "force_latency" {
        return match recommended.as_text() {
            Some(wanted) => Value::text(wanted.trim()),
            None => current.clone(),
        };
    }
    if let Some(v) = guard_na(current, recommended) {
        return v;
    }
    let wanted = recommended.as_text().map(str::trim).unwrap_or_default();
    let instances = InstanceMap::parse(current.as_text().unwrap_or_default());
    match name {
        "energy_perf_bias" => {
            Value::Text(instances.with_all_values(energy_perf_bias_of(wanted)).to_string())
        }
        "governor" => Value::Text(instances.with_all_values(wanted).to_string()),
        _ => recommended.clone(),
    }
}

/// Write a CPU setting
pub fn apply(host: &dyn Host, name: &str, value: &str) -> Result<()> {
    if name == "force_latency" {
        return apply_force_latency(host, value);
    }
    let Some(file) = file_of(name) else {
        tracing::debug!("{}: not a cpu setting, nothing to write", name);
        return Ok(());
    };

    for (key, v) in InstanceMap::parse(value).entries() {
        if key == ALL {
            let mut written = 0;
            for cpu in cpus(host)? {
                let path = format!("{}/{}/{}", CPU_DIR, cpu, file);
                if host.exists(&path) {
                    write_existing(host, name, &path, v)?;
                    written += 1;
                }
            }
            if written == 0 {
                return Err(TuneError::not_supported(name, "no CPU exposes this setting"));
            }
        } else {
            write_existing(host, name, &format!("{}/{}/{}", CPU_DIR, key, file), v)?;
        }
    }
    Ok(())
}

/// Disable every idle state whose exit latency exceeds `value`, enable
/// the rest
fn apply_force_latency(host: &dyn Host, value: &str) -> Result<()> {
    let limit: i64 = value
        .trim()
        .parse()
        .map_err(|_| TuneError::invalid_value("force_latency", value, "expected microseconds"))?;

    let mut touched = 0;
    for cpu in cpus(host)? {
        for state in idle_states(host, &cpu)? {
            let disable = if state.latency > limit { "1" } else { "0" };
            host.write(&format!("{}/disable", state.dir), disable)?;
            touched += 1;
        }
    }
    if touched == 0 {
        return Err(TuneError::not_supported("force_latency", "no cpuidle states"));
    }
    tracing::info!("force_latency: limited idle states to {}us", limit);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::testing::FakeHost;

    fn cpu_file(cpu: u32, file: &str) -> String {
        format!("{}/cpu{}/{}", CPU_DIR, cpu, file)
    }

    fn host_with(file: &str, values: &[&str]) -> FakeHost {
        values
            .iter()
            .enumerate()
            .fold(FakeHost::new(), |host, (i, v)| {
                host.with_file(&cpu_file(i as u32, file), v)
            })
            .with_file(&format!("{}/cpufreq/policy0", CPU_DIR), "")
    }

    fn idle_host() -> FakeHost {
        let mut host = FakeHost::new();
        for cpu in 0..2 {
            for (state, latency) in [(0, "0"), (1, "2"), (2, "70"), (3, "133")] {
                let dir = format!("cpuidle/state{}", state);
                host = host
                    .with_file(&cpu_file(cpu, &format!("{}/latency", dir)), latency)
                    .with_file(&cpu_file(cpu, &format!("{}/disable", dir)), "0");
            }
        }
        host
    }

    #[test]
    fn test_cpus_numeric_order() {
        let host = host_with("cpufreq/scaling_governor", &["a"; 11]);
        let cpus = cpus(&host).unwrap();
        assert_eq!(cpus.len(), 11);
        assert_eq!(cpus[2], "cpu2");
        assert_eq!(cpus[10], "cpu10");
    }

    #[test]
    fn test_inspect_per_cpu() {
        let host = host_with("power/energy_perf_bias", &["15\n", "6\n", "0\n"]);
        assert_eq!(
            inspect(&host, "energy_perf_bias").unwrap(),
            Value::text("cpu0:15 cpu1:6 cpu2:0")
        );

        let host = host_with("cpufreq/scaling_governor", &["powersave\n", "powersave\n"]);
        assert_eq!(
            inspect(&host, "governor").unwrap(),
            Value::text("all:powersave")
        );

        assert!(inspect(&FakeHost::new(), "governor").unwrap().is_na());
    }

    #[test]
    fn test_optimise_force_latency_without_idle_states() {
        assert_eq!(
            optimise("force_latency", &Value::Na, &Value::text("70")),
            Value::text("70")
        );
        assert_eq!(
            optimise("force_latency", &Value::text("133"), &Value::Na),
            Value::text("133")
        );
    }

    #[test]
    fn test_optimise() {
        assert_eq!(
            optimise("force_latency", &Value::text("1000"), &Value::text("70")),
            Value::text("70")
        );
        assert_eq!(
            optimise("energy_perf_bias", &Value::text("all:15"), &Value::text("performance")),
            Value::text("all:0")
        );
        assert_eq!(
            optimise(
                "energy_perf_bias",
                &Value::text("cpu0:15 cpu1:6 cpu2:0"),
                &Value::text("performance")
            ),
            Value::text("cpu0:0 cpu1:0 cpu2:0")
        );
        assert_eq!(
            optimise("energy_perf_bias", &Value::text("all:15"), &Value::text("normal")),
            Value::text("all:6")
        );
        assert_eq!(
            optimise("energy_perf_bias", &Value::text("all:15"), &Value::text("powersave")),
            Value::text("all:15")
        );
        assert_eq!(
            optimise("energy_perf_bias", &Value::text("all:15"), &Value::text("unknown")),
            Value::text("all:0")
        );
        assert_eq!(
            optimise("governor", &Value::text("all:powersave"), &Value::text("performance")),
            Value::text("all:performance")
        );
        assert_eq!(
            optimise(
                "governor",
                &Value::text("cpu0:powersave cpu1:performance cpu2:powersave"),
                &Value::text("performance")
            ),
            Value::text("cpu0:performance cpu1:performance cpu2:performance")
        );
        assert!(optimise("governor", &Value::Na, &Value::text("performance")).is_na());
    }

    #[test]
    fn test_apply_all_and_single() {
        let host = host_with("cpufreq/scaling_governor", &["powersave", "powersave"]);
        apply(&host, "governor", "all:performance").unwrap();
        assert_eq!(
            inspect(&host, "governor").unwrap(),
            Value::text("all:performance")
        );

        apply(&host, "governor", "cpu1:powersave").unwrap();
        assert_eq!(
            inspect(&host, "governor").unwrap(),
            Value::text("cpu0:performance cpu1:powersave")
        );

        assert!(apply(&host, "governor", "cpu7:powersave")
            .unwrap_err()
            .is_absent());
    }

    #[test]
    fn test_force_latency() {
        let host = idle_host();
        assert_eq!(inspect(&host, "force_latency").unwrap(), Value::text("133"));

        apply(&host, "force_latency", "70").unwrap();
        assert_eq!(inspect(&host, "force_latency").unwrap(), Value::text("70"));
        assert_eq!(
            host.file(&cpu_file(1, "cpuidle/state3/disable")).as_deref(),
            Some("1")
        );
        assert_eq!(
            host.file(&cpu_file(1, "cpuidle/state2/disable")).as_deref(),
            Some("0")
        );

        assert!(apply(&host, "force_latency", "fast").is_err());
        assert!(inspect(&FakeHost::new(), "force_latency").unwrap().is_na());
    }
}
