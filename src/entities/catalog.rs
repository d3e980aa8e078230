//! Static descriptor tables
//!
//! Common descriptors exist on every appliance and contain no placeholders.
//! The `*_TEMPLATES` tables are expanded once per discovered hardware instance.

use super::{MetricTemplate, SizeUnit, UnitHint};
use crate::format::StatusTable;
use crate::ugreen::endpoints::{
    NETWORK_IFACES, REBOOT, SHUTDOWN, SYSINFO_COMMON, SYSTEM_STATUS, TASKMGR_STATS,
    TEMPERATURE_MONITORING,
};

const BYTES: UnitHint = UnitHint::Size(SizeUnit::B);
const BYTES_PER_SECOND: UnitHint = UnitHint::Rate(SizeUnit::B);

/// Slow-cadence descriptors present on every appliance
pub const COMMON_CONFIG: &[MetricTemplate] = &[
    // Device
    MetricTemplate::new("type", "NAS Type", "mdi:nas", SYSTEM_STATUS, "data.type")
        .category("Device"),
    MetricTemplate::new("owner", "NAS Owner", "mdi:account", SYSINFO_COMMON, "data.common.nas_owner")
        .category("Device"),
    MetricTemplate::new("device_name", "NAS Name", "mdi:nas", SYSTEM_STATUS, "data.dev_name")
        .category("Device"),
    // Hardware
    MetricTemplate::new("cpu_model", "CPU Model", "mdi:chip", SYSINFO_COMMON, "data.hardware.cpu[0].model")
        .category("Hardware"),
    MetricTemplate::new("cpu_ghz", "CPU Speed", "mdi:speedometer", SYSINFO_COMMON, "data.hardware.cpu[0].ghz")
        .unit(UnitHint::Megahertz)
        .places(0)
        .category("Hardware"),
    MetricTemplate::new("cpu_core", "CPU Cores", "mdi:chip", SYSINFO_COMMON, "data.hardware.cpu[0].core")
        .unit(UnitHint::Label("Cores"))
        .places(0)
        .category("Hardware"),
    MetricTemplate::new("cpu_thread", "CPU Threads", "mdi:chip", SYSINFO_COMMON, "data.hardware.cpu[0].thread")
        .unit(UnitHint::Label("Threads"))
        .places(0)
        .category("Hardware"),
    // Runtime
    MetricTemplate::new("last_boot_date", "Last Boot", "mdi:calendar", SYSTEM_STATUS, "data.last_boot_date")
        .category("Status"),
    MetricTemplate::new("last_boot_time", "Last Boot Timestamp", "mdi:clock", SYSTEM_STATUS, "data.last_boot_time")
        .category("Status"),
    MetricTemplate::new("total_run_time", "Total Runtime", "mdi:timer-outline", SYSTEM_STATUS, "data.total_run_time")
        .unit(UnitHint::Seconds)
        .category("Status"),
    // System status
    MetricTemplate::new("server_status", "Server Status", "mdi:server", SYSTEM_STATUS, "data.server_status")
        .status(StatusTable::ServerStatus)
        .category("Status"),
    MetricTemplate::new("status", "System Status Code", "mdi:information", SYSTEM_STATUS, "data.status")
        .category("Status"),
    MetricTemplate::new("cpu_status", "CPU Temperature Status", "mdi:alert", TEMPERATURE_MONITORING, "data.cpu_status")
        .category("Status"),
    MetricTemplate::new("temperature_status", "Temperature Status Code", "mdi:information", TEMPERATURE_MONITORING, "data.status")
        .category("Status"),
    MetricTemplate::new("temperature_message", "Temperature Message", "mdi:message-alert", TEMPERATURE_MONITORING, "data.message")
        .category("Status"),
    MetricTemplate::new("message", "System Message", "mdi:message", SYSTEM_STATUS, "data.message")
        .category("Status"),
];

/// Fast-cadence descriptors present on every appliance
pub const COMMON_STATE: &[MetricTemplate] = &[
    // CPU
    MetricTemplate::new("cpu_usage", "CPU Usage", "mdi:chip", TASKMGR_STATS, "data.overview.cpu[0].used_percent")
        .unit(UnitHint::Percent)
        .places(0)
        .category("Status"),
    MetricTemplate::new("cpu_temperature", "CPU Temperature", "mdi:thermometer", TASKMGR_STATS, "data.overview.cpu[0].temp")
        .unit(UnitHint::Celsius)
        .places(0)
        .category("Status"),
    // RAM
    MetricTemplate::new("mem_usage", "RAM Usage", "mdi:memory", TASKMGR_STATS, "data.overview.mem[0].used_percent")
        .unit(UnitHint::Percent)
        .category("Status"),
    MetricTemplate::new("ram_usage_total_usable", "RAM Usage (Usable RAM)", "mdi:memory", TASKMGR_STATS, "data.mem.structure.total")
        .unit(BYTES)
        .category("Status"),
    MetricTemplate::new("ram_usage_free", "RAM Usage (Free RAM)", "mdi:memory", TASKMGR_STATS, "data.mem.structure.free")
        .unit(BYTES)
        .category("Status"),
    MetricTemplate::new("ram_usage_cache", "RAM Usage (Cache)", "mdi:memory", TASKMGR_STATS, "data.mem.structure.cache")
        .unit(BYTES)
        .category("Status"),
    MetricTemplate::new("ram_usage_shared", "RAM Usage (Shared Mem)", "mdi:memory", TASKMGR_STATS, "data.mem.structure.share")
        .unit(BYTES)
        .category("Status"),
    MetricTemplate::new("ram_usage_used_gb", "RAM Usage (Used GB)", "mdi:memory", TASKMGR_STATS, "data.mem.structure.used")
        .unit(BYTES)
        .category("Status"),
    // Fans
    MetricTemplate::new("fan_status_overall", "Fan Status (overall)", "mdi:fan-alert", TEMPERATURE_MONITORING, "data.fan_status")
        .status(StatusTable::FanOverall)
        .category("Status"),
    // Throughput
    MetricTemplate::new("overall_lan_upload_raw", "Overall LAN Upload (raw)", "mdi:upload-network", TASKMGR_STATS, "data.net.series[0].send_rate")
        .unit(BYTES_PER_SECOND)
        .category("Status"),
    MetricTemplate::new("overall_lan_upload", "Overall LAN Upload", "mdi:upload-network", TASKMGR_STATS, "calculated:scale_bytes_per_second:data.net.series[0].send_rate")
        .category("Status"),
    MetricTemplate::new("overall_lan_download_raw", "Overall LAN Download (raw)", "mdi:download-network", TASKMGR_STATS, "data.net.series[0].recv_rate")
        .unit(BYTES_PER_SECOND)
        .category("Status"),
    MetricTemplate::new("overall_lan_download", "Overall LAN Download", "mdi:download-network", TASKMGR_STATS, "calculated:scale_bytes_per_second:data.net.series[0].recv_rate")
        .category("Status"),
    MetricTemplate::new("overall_disk_read_rate_raw", "Overall Disk Read Rate (raw)", "mdi:harddisk", TASKMGR_STATS, "data.disk.series[0].read_rate")
        .unit(BYTES_PER_SECOND)
        .category("Status"),
    MetricTemplate::new("overall_disk_read_rate", "Overall Disk Read Rate", "mdi:harddisk", TASKMGR_STATS, "calculated:scale_bytes_per_second:data.disk.series[0].read_rate")
        .category("Status"),
    MetricTemplate::new("overall_disk_write_rate_raw", "Overall Disk Write Rate (raw)", "mdi:harddisk", TASKMGR_STATS, "data.disk.series[0].write_rate")
        .unit(BYTES_PER_SECOND)
        .category("Status"),
    MetricTemplate::new("overall_disk_write_rate", "Overall Disk Write Rate", "mdi:harddisk", TASKMGR_STATS, "calculated:scale_bytes_per_second:data.disk.series[0].write_rate")
        .category("Status"),
    MetricTemplate::new("overall_volume_read_rate_raw", "Overall Volume Read Rate (raw)", "mdi:harddisk", TASKMGR_STATS, "data.volume.series[0].read_rate")
        .unit(BYTES_PER_SECOND)
        .category("Status"),
    MetricTemplate::new("overall_volume_read_rate", "Overall Volume Read Rate", "mdi:harddisk", TASKMGR_STATS, "calculated:scale_bytes_per_second:data.volume.series[0].read_rate")
        .category("Status"),
    MetricTemplate::new("overall_volume_write_rate_raw", "Overall Volume Write Rate (raw)", "mdi:harddisk", TASKMGR_STATS, "data.volume.series[0].write_rate")
        .unit(BYTES_PER_SECOND)
        .category("Status"),
    MetricTemplate::new("overall_volume_write_rate", "Overall Volume Write Rate", "mdi:harddisk", TASKMGR_STATS, "calculated:scale_bytes_per_second:data.volume.series[0].write_rate")
        .category("Status"),
];

/// Write-only actions
pub const BUTTONS: &[MetricTemplate] = &[
    MetricTemplate::new("shutdown", "Shutdown", "mdi:power", SHUTDOWN, "").post(),
    MetricTemplate::new("reboot", "Reboot", "mdi:restart", REBOOT, "").post(),
];

/// Sum of all RAM module sizes, added after the RAM module descriptors
pub const RAM_TOTAL: MetricTemplate = MetricTemplate::new(
    "ram_total_size",
    "RAM Total Size",
    "mdi:memory",
    SYSINFO_COMMON,
    "calculated:ram_total_size",
)
.unit(BYTES)
.places(0)
.category("Hardware");

pub const LAN_CONFIG_TEMPLATES: &[MetricTemplate] = &[
    MetricTemplate::new("{prefix_key}_model", "{prefix_name} Model", "mdi:lan", "{endpoint}", "data.hardware.net[{i}].model")
        .category("Network"),
    MetricTemplate::new("{prefix_key}_ip", "{prefix_name} IP", "mdi:lan", "{endpoint}", "data.hardware.net[{i}].ip")
        .category("Network"),
    MetricTemplate::new("{prefix_key}_mac", "{prefix_name} MAC", "mdi:lan", "{endpoint}", "data.hardware.net[{i}].mac")
        .category("Network"),
    MetricTemplate::new("{prefix_key}_speed", "{prefix_name} Speed", "mdi:speedometer", "{endpoint}", "data.hardware.net[{i}].speed")
        .unit(UnitHint::Label("Mb/s"))
        .category("Network"),
    MetricTemplate::new("{prefix_key}_mtu", "{prefix_name} MTU", "mdi:lan", "{endpoint}", "data.hardware.net[{i}].mtu")
        .category("Network"),
    MetricTemplate::new("{prefix_key}_netmask", "{prefix_name} Netmask", "mdi:lan", "{endpoint}", "data.hardware.net[{i}].mask")
        .category("Network"),
    MetricTemplate::new("{prefix_key}_gateway", "{prefix_name} Gateway", "mdi:lan", NETWORK_IFACES, "data.ifaces[{i}].ipv4.gateway")
        .category("Network"),
    MetricTemplate::new("{prefix_key}_dnsserver", "{prefix_name} DNS Server", "mdi:lan", NETWORK_IFACES, "data.ifaces[{i}].ipv4.dns[0]")
        .category("Network"),
];

pub const USB_CONFIG_TEMPLATES: &[MetricTemplate] = &[
    MetricTemplate::new("{prefix_key}_model", "{prefix_name} Model", "mdi:usb-port", "{endpoint}", "data.hardware.usb[{i}].model")
        .category("USB"),
    MetricTemplate::new("{prefix_key}_vendor", "{prefix_name} Vendor", "mdi:usb-port", "{endpoint}", "data.hardware.usb[{i}].vendor")
        .category("USB"),
    MetricTemplate::new("{prefix_key}_type", "{prefix_name} Type", "mdi:usb-port", "{endpoint}", "data.hardware.usb[{i}].device_type")
        .status(StatusTable::UsbDeviceType)
        .category("USB"),
];

pub const UPS_CONFIG_TEMPLATES: &[MetricTemplate] = &[
    MetricTemplate::new("{prefix_key}_model", "{prefix_name} Model", "mdi:power-plug-battery", "{endpoint}", "data.hardware.ups[0].model")
        .category("UPS"),
    MetricTemplate::new("{prefix_key}_vendor", "{prefix_name} Vendor", "mdi:factory", "{endpoint}", "data.hardware.ups[0].vendor")
        .category("UPS"),
    MetricTemplate::new("{prefix_key}_power_free", "{prefix_name} Power Remaining", "mdi:power-plug-battery", "{endpoint}", "data.hardware.ups[0].power_free")
        .category("UPS"),
];

pub const RAM_CONFIG_TEMPLATES: &[MetricTemplate] = &[
    MetricTemplate::new("{prefix_key}_model", "{prefix_name} Model", "mdi:memory", "{endpoint}", "data.hardware.mem[{i}].model")
        .category("Hardware"),
    MetricTemplate::new("{prefix_key}_manufacturer", "{prefix_name} Manufacturer", "mdi:factory", "{endpoint}", "data.hardware.mem[{i}].manufacturer")
        .category("Hardware"),
    MetricTemplate::new("{prefix_key}_size", "{prefix_name} Size", "mdi:memory", "{endpoint}", "data.hardware.mem[{i}].size")
        .unit(BYTES)
        .places(0)
        .category("Hardware"),
    MetricTemplate::new("{prefix_key}_speed", "{prefix_name} Speed", "mdi:speedometer", "{endpoint}", "data.hardware.mem[{i}].mhz")
        .unit(UnitHint::Megahertz)
        .places(0)
        .category("Hardware"),
];

pub const POOL_CONFIG_TEMPLATES: &[MetricTemplate] = &[
    MetricTemplate::new("{prefix_key}_name", "({prefix_name}) Name", "mdi:chip", "{endpoint}", "data.result[{i}].name")
        .category("Pools"),
    MetricTemplate::new("{prefix_key}_label", "({prefix_name}) Label", "mdi:label-outline", "{endpoint}", "data.result[{i}].label")
        .category("Pools"),
    MetricTemplate::new("{prefix_key}_level", "({prefix_name}) Level", "mdi:database-settings", "{endpoint}", "data.result[{i}].level")
        .category("Pools"),
    MetricTemplate::new("{prefix_key}_status", "({prefix_name}) Status", "mdi:check-circle-outline", "{endpoint}", "data.result[{i}].status")
        .category("Pools"),
    MetricTemplate::new("{prefix_key}_total", "({prefix_name}) Total Size", "mdi:database", "{endpoint}", "data.result[{i}].total")
        .unit(BYTES)
        .category("Pools"),
    MetricTemplate::new("{prefix_key}_used", "({prefix_name}) Used Size", "mdi:database-check", "{endpoint}", "data.result[{i}].used")
        .unit(BYTES)
        .category("Pools"),
    MetricTemplate::new("{prefix_key}_free", "({prefix_name}) Free Size", "mdi:database-minus", "{endpoint}", "data.result[{i}].free")
        .unit(BYTES)
        .category("Pools"),
    MetricTemplate::new("{prefix_key}_available", "({prefix_name}) Available Size", "mdi:database-plus", "{endpoint}", "data.result[{i}].available")
        .unit(BYTES)
        .category("Pools"),
    MetricTemplate::new("{prefix_key}_disk_count", "({prefix_name}) Disk Count", "mdi:harddisk", "{endpoint}", "data.result[{i}].total_disk_num")
        .category("Pools"),
];

pub const VOLUME_CONFIG_TEMPLATES: &[MetricTemplate] = &[
    MetricTemplate::new("{prefix_key}_status", "{prefix_name} Status", "mdi:check-circle-outline", "{endpoint}", "data.result[{pool_index}].volumes[{i}].status")
        .category("Volumes"),
    MetricTemplate::new("{prefix_key}_health", "{prefix_name} Health", "mdi:heart-pulse", "{endpoint}", "data.result[{pool_index}].volumes[{i}].health")
        .status(StatusTable::VolumeHealth)
        .category("Volumes"),
    MetricTemplate::new("{prefix_key}_name", "{prefix_name} Name", "mdi:label", "{endpoint}", "data.result[{pool_index}].volumes[{i}].name")
        .category("Volumes"),
    MetricTemplate::new("{prefix_key}_label", "{prefix_name} Label", "mdi:label-outline", "{endpoint}", "data.result[{pool_index}].volumes[{i}].label")
        .category("Volumes"),
    MetricTemplate::new("{prefix_key}_poolname", "{prefix_name} Pool Name", "mdi:database", "{endpoint}", "data.result[{pool_index}].volumes[{i}].poolname")
        .category("Volumes"),
    MetricTemplate::new("{prefix_key}_total", "{prefix_name} Total Size", "mdi:database", "{endpoint}", "data.result[{pool_index}].volumes[{i}].total")
        .unit(BYTES)
        .category("Volumes"),
    MetricTemplate::new("{prefix_key}_used", "{prefix_name} Used Size", "mdi:database-check", "{endpoint}", "data.result[{pool_index}].volumes[{i}].used")
        .unit(BYTES)
        .category("Volumes"),
    MetricTemplate::new("{prefix_key}_available", "{prefix_name} Available Size", "mdi:database-plus", "{endpoint}", "data.result[{pool_index}].volumes[{i}].available")
        .unit(BYTES)
        .category("Volumes"),
    MetricTemplate::new("{prefix_key}_hascache", "{prefix_name} Has Cache", "mdi:cached", "{endpoint}", "data.result[{pool_index}].volumes[{i}].hascache")
        .category("Volumes"),
    MetricTemplate::new("{prefix_key}_filesystem", "{prefix_name} Filesystem", "mdi:file-cog", "{endpoint}", "data.result[{pool_index}].volumes[{i}].filesystem")
        .category("Volumes"),
];

pub const DISK_CONFIG_TEMPLATES: &[MetricTemplate] = &[
    MetricTemplate::new("{prefix_key}_type", "{prefix_name} Type", "mdi:harddisk", "{endpoint}", "data.result[{series_index}].type")
        .status(StatusTable::DiskType)
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_interface_type", "{prefix_name} Interface Type", "mdi:usb-port", "{endpoint}", "data.result[{series_index}].interface_type")
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_label", "{prefix_name} Label", "mdi:label-outline", "{endpoint}", "data.result[{series_index}].label")
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_serial", "{prefix_name} Serial", "mdi:barcode", "{endpoint}", "data.result[{series_index}].serial")
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_size", "{prefix_name} Size", "mdi:database", "{endpoint}", "data.result[{series_index}].size")
        .unit(BYTES)
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_name", "{prefix_name} Name", "mdi:tag", "{endpoint}", "data.result[{series_index}].name")
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_dev_name", "{prefix_name} Device", "mdi:usb-port", "{endpoint}", "data.result[{series_index}].dev_name")
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_slot", "{prefix_name} Slot", "mdi:server", "{endpoint}", "data.result[{series_index}].slot")
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_used_for", "{prefix_name} Used For", "mdi:database-marker", "{endpoint}", "data.result[{series_index}].used_for")
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_status", "{prefix_name} Status", "mdi:check-circle-outline", "{endpoint}", "data.result[{series_index}].status")
        .status(StatusTable::DiskStatus)
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_temperature", "{prefix_name} Temperature", "mdi:thermometer", "{endpoint}", "data.result[{series_index}].temperature")
        .unit(UnitHint::Celsius)
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_power_on_hours", "{prefix_name} Power-On Hours", "mdi:clock-outline", "{endpoint}", "data.result[{series_index}].power_on_hours")
        .category("Disks"),
    MetricTemplate::new("{prefix_key}_brand", "{prefix_name} Brand", "mdi:tag", "{endpoint}", "data.result[{series_index}].brand")
        .category("Disks"),
];

pub const LAN_STATUS_TEMPLATES: &[MetricTemplate] = &[
    MetricTemplate::new("{prefix_key}_upload_raw", "{prefix_name} Upload (raw)", "mdi:upload-network", "{endpoint}", "data.net.series[{series_index}].send_rate")
        .unit(BYTES_PER_SECOND)
        .places(0)
        .category("Status"),
    MetricTemplate::new("{prefix_key}_download_raw", "{prefix_name} Download (raw)", "mdi:download-network", "{endpoint}", "data.net.series[{series_index}].recv_rate")
        .unit(BYTES_PER_SECOND)
        .places(0)
        .category("Status"),
    MetricTemplate::new("{prefix_key}_upload", "{prefix_name} Upload", "mdi:upload-network", "{endpoint}", "calculated:scale_bytes_per_second:data.net.series[{series_index}].send_rate")
        .places(0)
        .category("Status"),
    MetricTemplate::new("{prefix_key}_download", "{prefix_name} Download", "mdi:download-network", "{endpoint}", "calculated:scale_bytes_per_second:data.net.series[{series_index}].recv_rate")
        .places(0)
        .category("Status"),
];

pub const DISK_STATUS_TEMPLATES: &[MetricTemplate] = &[
    MetricTemplate::new("{prefix_key}_temperature", "{prefix_name} Temperature", "mdi:thermometer", "{endpoint}", "data.disk.series[{series_index}].temperature")
        .unit(UnitHint::Celsius)
        .places(1)
        .category("Status"),
    MetricTemplate::new("{prefix_key}_read_rate_raw", "{prefix_name} Read Rate (raw)", "mdi:download", "{endpoint}", "data.disk.series[{series_index}].read_rate")
        .unit(BYTES_PER_SECOND)
        .places(0)
        .category("Status"),
    MetricTemplate::new("{prefix_key}_read_rate", "{prefix_name} Read Rate", "mdi:download", "{endpoint}", "calculated:scale_bytes_per_second:data.disk.series[{series_index}].read_rate")
        .places(0)
        .category("Status"),
    MetricTemplate::new("{prefix_key}_write_rate_raw", "{prefix_name} Write Rate (raw)", "mdi:upload", "{endpoint}", "data.disk.series[{series_index}].write_rate")
        .unit(BYTES_PER_SECOND)
        .places(0)
        .category("Status"),
    MetricTemplate::new("{prefix_key}_write_rate", "{prefix_name} Write Rate", "mdi:upload", "{endpoint}", "calculated:scale_bytes_per_second:data.disk.series[{series_index}].write_rate")
        .places(0)
        .category("Status"),
];

/// The CPU fan is a single unit, so its keys are literal
pub const CPU_FAN_STATUS_TEMPLATES: &[MetricTemplate] = &[
    MetricTemplate::new("cpu_fan_speed", "CPU Fan", "mdi:fan", "{endpoint}", "data.overview.cpu_fan[0].speed")
        .unit(UnitHint::Rpm)
        .category("Status"),
    MetricTemplate::new("cpu_fan_status", "CPU Fan Status", "mdi:fan-alert", "{endpoint}", "data.overview.cpu_fan[0].status")
        .status(StatusTable::FanUnit)
        .category("Status"),
];

pub const DEVICE_FAN_STATUS_TEMPLATES: &[MetricTemplate] = &[
    MetricTemplate::new("{prefix_key}_speed", "{prefix_name}", "mdi:fan", "{endpoint}", "data.overview.device_fan[{i}].speed")
        .unit(UnitHint::Rpm)
        .category("Status"),
    MetricTemplate::new("{prefix_key}_status", "{prefix_name} Status", "mdi:fan-alert", "{endpoint}", "data.overview.device_fan[{i}].status")
        .status(StatusTable::FanUnit)
        .category("Status"),
];
