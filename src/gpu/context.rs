//! Shared wgpu device and queue.

use std::sync::Arc;

use log::info;

use crate::error::SessionError;

/// Device and queue shared by the compute backend and the renderer
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
}

impl GpuContext {
    /// Create a context without a window surface (headless runs and tests)
    pub async fn headless() -> Result<Self, SessionError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| SessionError::GpuUnavailable("no compatible adapter".to_string()))?;

        Self::from_adapter(&adapter).await
    }

    /// Request a device from an already selected adapter
    pub async fn from_adapter(adapter: &wgpu::Adapter) -> Result<Self, SessionError> {
        let adapter_name = adapter.get_info().name;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Diffusion Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| SessionError::GpuUnavailable(format!("Failed to request device: {}", e)))?;

        info!("GPU: {}", adapter_name);

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
        })
    }
}
