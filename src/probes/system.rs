//! Host facts: operating system, CPU, memory, clock
//!
//! Local answers come from `sysinfo` and `chrono`; remote Windows hosts are
//! asked through CIM and return the same JSON shape.

use super::{blocking, run_ps_json};
use crate::core::{ProbeContext, Reply};
use crate::utils::ProbeError;
use serde::{Deserialize, Serialize};
use sysinfo::System;

const REMOTE_OS_SCRIPT: &str = r#"
$os = Get-CimInstance Win32_OperatingSystem
[pscustomobject]@{
    platform = 'win32'
    distro = [string]$os.Caption
    release = [string]$os.Version
    kernel = [string]$os.BuildNumber
    arch = [string]$os.OSArchitecture
    hostname = [string]$os.CSName
} | ConvertTo-Json -Compress
"#;

const REMOTE_CPU_SCRIPT: &str = r#"
$p = @(Get-CimInstance Win32_Processor)
[pscustomobject]@{
    manufacturer = [string]$p[0].Manufacturer
    brand = ([string]$p[0].Name).Trim()
    speed = [math]::Round($p[0].MaxClockSpeed / 1000, 2)
    cores = [int](($p | Measure-Object -Property NumberOfLogicalProcessors -Sum).Sum)
    physicalCores = [int](($p | Measure-Object -Property NumberOfCores -Sum).Sum)
} | ConvertTo-Json -Compress
"#;

const REMOTE_MEM_SCRIPT: &str = r#"
$os = Get-CimInstance Win32_OperatingSystem
$pf = @(Get-CimInstance Win32_PageFileUsage)
$total = [int64]$os.TotalVisibleMemorySize * 1024
$free = [int64]$os.FreePhysicalMemory * 1024
$swapTotal = [int64](($pf | Measure-Object -Property AllocatedBaseSize -Sum).Sum) * 1MB
$swapUsed = [int64](($pf | Measure-Object -Property CurrentUsage -Sum).Sum) * 1MB
[pscustomobject]@{
    total = $total
    free = $free
    used = $total - $free
    available = $free
    swaptotal = $swapTotal
    swapused = $swapUsed
    swapfree = $swapTotal - $swapUsed
} | ConvertTo-Json -Compress
"#;

const REMOTE_TIME_SCRIPT: &str = r#"
$os = Get-CimInstance Win32_OperatingSystem
$tz = Get-TimeZone
$offset = $tz.GetUtcOffset((Get-Date))
[pscustomobject]@{
    current = [DateTimeOffset]::UtcNow.ToUnixTimeMilliseconds()
    uptime = [int64]((Get-Date) - $os.LastBootUpTime).TotalSeconds
    timezone = 'GMT' + $(if ($offset -lt [TimeSpan]::Zero) { '-' } else { '+' }) + $offset.ToString('hhmm')
    timezoneName = [string]$tz.Id
} | ConvertTo-Json -Compress
"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsInfo {
    pub platform: String,
    pub distro: String,
    pub release: String,
    pub kernel: String,
    pub arch: String,
    pub hostname: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CpuInfo {
    pub manufacturer: String,
    pub brand: String,
    /// GHz
    pub speed: f64,
    /// Logical processors
    pub cores: u32,
    pub physical_cores: u32,
}

/// All values in bytes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemInfo {
    pub total: u64,
    pub free: u64,
    pub used: u64,
    pub available: u64,
    pub swaptotal: u64,
    pub swapused: u64,
    pub swapfree: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeInfo {
    /// Milliseconds since the Unix epoch
    pub current: i64,
    /// Seconds since boot
    pub uptime: u64,
    pub timezone: String,
    pub timezone_name: String,
}

fn local_os_info(platform: String) -> OsInfo {
    OsInfo {
        platform,
        distro: System::name().unwrap_or_default(),
        release: System::os_version().unwrap_or_default(),
        kernel: System::kernel_version().unwrap_or_default(),
        arch: std::env::consts::ARCH.to_string(),
        hostname: System::host_name().unwrap_or_default(),
    }
}

fn local_cpu() -> CpuInfo {
    let mut sys = System::new();
    sys.refresh_cpu();
    let cpus = sys.cpus();
    let first = cpus.first();
    CpuInfo {
        manufacturer: first.map(|c| c.vendor_id().to_string()).unwrap_or_default(),
        brand: first.map(|c| c.brand().trim().to_string()).unwrap_or_default(),
        speed: first.map(|c| c.frequency() as f64 / 1000.0).unwrap_or(0.0),
        cores: u32::try_from(cpus.len()).unwrap_or(u32::MAX),
        physical_cores: sys
            .physical_core_count()
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0),
    }
}

fn local_mem() -> MemInfo {
    let mut sys = System::new();
    sys.refresh_memory();
    MemInfo {
        total: sys.total_memory(),
        free: sys.free_memory(),
        used: sys.used_memory(),
        available: sys.available_memory(),
        swaptotal: sys.total_swap(),
        swapused: sys.used_swap(),
        swapfree: sys.free_swap(),
    }
}

fn local_time() -> TimeInfo {
    let now = chrono::Local::now();
    let offset = now.format("%:z").to_string();
    TimeInfo {
        current: now.timestamp_millis(),
        uptime: System::uptime(),
        timezone: now.format("GMT%z").to_string(),
        timezone_name: std::env::var("TZ")
            .ok()
            .filter(|tz| !tz.is_empty())
            .unwrap_or(offset),
    }
}

pub async fn os_info(ctx: ProbeContext, reply: Reply) -> Result<(), ProbeError> {
    let info: OsInfo = if ctx.is_remote() {
        run_ps_json(&ctx, REMOTE_OS_SCRIPT, "os_info").await?
    } else {
        let platform = ctx.platform_label();
        blocking(move || local_os_info(platform)).await?
    };
    reply.send(info);
    Ok(())
}

pub async fn cpu(ctx: ProbeContext, reply: Reply) -> Result<(), ProbeError> {
    let info: CpuInfo = if ctx.is_remote() {
        run_ps_json(&ctx, REMOTE_CPU_SCRIPT, "cpu").await?
    } else {
        blocking(local_cpu).await?
    };
    reply.send(info);
    Ok(())
}

pub async fn mem(ctx: ProbeContext, reply: Reply) -> Result<(), ProbeError> {
    let info: MemInfo = if ctx.is_remote() {
        run_ps_json(&ctx, REMOTE_MEM_SCRIPT, "mem").await?
    } else {
        blocking(local_mem).await?
    };
    reply.send(info);
    Ok(())
}

pub async fn time(ctx: ProbeContext, reply: Reply) -> Result<(), ProbeError> {
    let info: TimeInfo = if ctx.is_remote() {
        run_ps_json(&ctx, REMOTE_TIME_SCRIPT, "time").await?
    } else {
        local_time()
    };
    reply.send(info);
    Ok(())
}
