use candle_core::Device;

/// Metal when compiled in and present, CPU otherwise.
pub fn select_device() -> Device {
    let device = metal_device().unwrap_or(Device::Cpu);
    let name = if device.is_metal() { "metal" } else { "cpu" };
    tracing::info!(device = name, "compute device selected");
    device
}

#[cfg(feature = "metal")]
fn metal_device() -> Option<Device> {
    Device::new_metal(0).ok()
}

#[cfg(not(feature = "metal"))]
fn metal_device() -> Option<Device> {
    None
}
