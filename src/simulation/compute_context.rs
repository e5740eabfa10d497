//! Compute device, context and kernel
//!
//! One adapter and device are shared by the compute kernel and the renderer, so the
//! simulation images never leave GPU memory between a step and the frame that shows it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use wgpu::{Adapter, BindGroupLayout, ComputePipeline, Device, Queue, ShaderStages};

use crate::error::{AutomataError, Result};
use crate::wgpu_utils::binding_types;

/// Format of both simulation images
pub const IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Kernels must declare `@workgroup_size(8, 8, 1)`
pub const KERNEL_WORKGROUP_SIZE: u32 = 8;
/// Entry point looked up when none is configured
pub const DEFAULT_ENTRY_POINT: &str = "iterate";

/// WGSL kernel text plus the entry point to run
#[derive(Debug, Clone)]
pub struct KernelSource {
    pub label: String,
    pub code: String,
    pub entry_point: String,
}

impl KernelSource {
    pub fn from_file(path: impl AsRef<Path>, entry_point: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let code = std::fs::read_to_string(path).map_err(|source| AutomataError::KernelSource {
            path: PathBuf::from(path),
            source,
        })?;

        Ok(Self {
            label: path.display().to_string(),
            code,
            entry_point: entry_point.into(),
        })
    }

    #[cfg(test)]
    pub fn from_wgsl(label: &str, code: &str, entry_point: &str) -> Self {
        Self {
            label: label.to_string(),
            code: code.to_string(),
            entry_point: entry_point.to_string(),
        }
    }
}

/// Compiled kernel and the binding layout it was built against
pub struct Kernel {
    pipeline: ComputePipeline,
    bind_group_layout: BindGroupLayout,
    entry_point: String,
}

impl Kernel {
    pub fn pipeline(&self) -> &ComputePipeline {
        &self.pipeline
    }

    /// Binding 0 = input image (sampled), binding 1 = output image (storage, write)
    pub fn bind_group_layout(&self) -> &BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Workgroups covering a `width` x `height` grid with one invocation per cell
    pub fn workgroups(width: u32, height: u32) -> (u32, u32) {
        (
            width.div_ceil(KERNEL_WORKGROUP_SIZE),
            height.div_ceil(KERNEL_WORKGROUP_SIZE),
        )
    }
}

/// Device, queue and compiled kernel, created once for the life of the process
pub struct ComputeContext {
    adapter: Adapter,
    device: Arc<Device>,
    queue: Arc<Queue>,
    kernel: Kernel,
}

impl ComputeContext {
    /// Pick an adapter able to present to `surface` (if given) and run compute, create
    /// the shared device and build the kernel.
    pub async fn new(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
        source: &KernelSource,
    ) -> Result<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await?;

        check_adapter(&adapter)?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Automata Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await?;

        let kernel = build_kernel(&device, source).await?;
        log::info!(
            "Built kernel '{}' from {}",
            kernel.entry_point(),
            source.label
        );

        Ok(Self {
            adapter,
            device: Arc::new(device),
            queue: Arc::new(queue),
            kernel,
        })
    }

    /// Read the kernel from `path` and initialize against `surface`
    pub async fn initialize(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
        kernel_path: impl AsRef<Path>,
        entry_point: &str,
    ) -> Result<Self> {
        let source = KernelSource::from_file(kernel_path, entry_point)?;
        Self::new(instance, surface, &source).await
    }

    /// Context with no presentation surface, blocking until ready
    pub fn headless(source: &KernelSource) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        pollster::block_on(Self::new(&instance, None, source))
    }

    pub fn adapter(&self) -> &Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Shared handles for the renderer
    pub fn shared(&self) -> (Arc<Device>, Arc<Queue>) {
        (self.device.clone(), self.queue.clone())
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }
}

fn check_adapter(adapter: &Adapter) -> Result<()> {
    let info = adapter.get_info();
    log::info!(
        "Using adapter: {} ({:?}, {:?})",
        info.name,
        info.device_type,
        info.backend
    );

    if !adapter
        .get_downlevel_capabilities()
        .flags
        .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
    {
        return Err(AutomataError::UnsupportedAdapter {
            name: info.name,
            reason: "compute shaders are not supported".to_string(),
        });
    }

    let format_features = adapter.get_texture_format_features(IMAGE_FORMAT);
    if !format_features
        .allowed_usages
        .contains(wgpu::TextureUsages::STORAGE_BINDING)
    {
        return Err(AutomataError::UnsupportedAdapter {
            name: info.name,
            reason: format!("{:?} cannot be used as a storage image", IMAGE_FORMAT),
        });
    }

    if !matches!(
        info.device_type,
        wgpu::DeviceType::DiscreteGpu | wgpu::DeviceType::IntegratedGpu
    ) {
        log::warn!(
            "Adapter '{}' is not a GPU ({:?}); stepping will be slow",
            info.name,
            info.device_type
        );
    }

    Ok(())
}

async fn build_kernel(device: &Device, source: &KernelSource) -> Result<Kernel> {
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Kernel Bind Group Layout"),
        entries: &[
            binding_types::entry(0, ShaderStages::COMPUTE, binding_types::texture_2d()),
            binding_types::entry(
                1,
                ShaderStages::COMPUTE,
                binding_types::image_2d(IMAGE_FORMAT, wgpu::StorageTextureAccess::WriteOnly),
            ),
        ],
    });

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&source.label),
        source: wgpu::ShaderSource::Wgsl(source.code.as_str().into()),
    });
    let compilation_info = module.get_compilation_info().await;

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Kernel Pipeline Layout"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Kernel Pipeline"),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some(&source.entry_point),
        compilation_options: Default::default(),
        cache: None,
    });

    if let Some(error) = device.pop_error_scope().await {
        return Err(AutomataError::KernelBuild {
            entry_point: source.entry_point.clone(),
            log: build_log(&compilation_info, &error),
        });
    }

    for message in &compilation_info.messages {
        log::warn!("{}: {}", source.label, format_message(message));
    }

    Ok(Kernel {
        pipeline,
        bind_group_layout,
        entry_point: source.entry_point.clone(),
    })
}

fn format_message(message: &wgpu::CompilationMessage) -> String {
    let severity = match message.message_type {
        wgpu::CompilationMessageType::Error => "error",
        wgpu::CompilationMessageType::Warning => "warning",
        wgpu::CompilationMessageType::Info => "info",
    };
    match &message.location {
        Some(location) => format!(
            "{}:{}: {}: {}",
            location.line_number, location.line_position, severity, message.message
        ),
        None => format!("{}: {}", severity, message.message),
    }
}

/// Compiler messages followed by the validation error that stopped the build
fn build_log(info: &wgpu::CompilationInfo, error: &wgpu::Error) -> String {
    let mut log: Vec<String> = info.messages.iter().map(format_message).collect();
    log.push(error.to_string());
    log.join("\n")
}
