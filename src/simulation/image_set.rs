//! The pair of simulation images and the step that advances them
//!
//! Both images live on the GPU for the whole session. Each step reads the current output
//! image, writes the other one, and then the two swap roles, so the renderer always
//! samples a finished generation and never the one being written.

use std::path::Path;

use wgpu::{BindGroup, Device};

use crate::error::{AutomataError, Result};
use crate::gfx::resources::TextureResource;
use crate::wgpu_utils::ReadbackBuffer;

use super::compute_context::{ComputeContext, Kernel, IMAGE_FORMAT};
use super::ping_pong::{PingPong, Slot};
use super::seed::SeedImage;

pub struct SimulationImageSet {
    images: [TextureResource; 2],
    /// Indexed by the output slot: reads that slot, writes the other
    step_bind_groups: [BindGroup; 2],
    roles: PingPong,
    width: u32,
    height: u32,
}

impl SimulationImageSet {
    /// Decode the seed image and allocate the pair from it
    pub fn create(context: &ComputeContext, seed_path: impl AsRef<Path>) -> Result<Self> {
        let seed = SeedImage::load(seed_path)?;
        Self::from_seed(context, &seed)
    }

    /// Upload `seed` into slot A and allocate slot B with the same size and format.
    /// Slot A starts visible, slot B is the first write target.
    pub fn from_seed(context: &ComputeContext, seed: &SeedImage) -> Result<Self> {
        let device = context.device();
        let (width, height) = seed.size();

        let max = device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(AutomataError::SeedTooLarge { width, height, max });
        }

        let images = [
            TextureResource::create_simulation_image(
                device,
                width,
                height,
                IMAGE_FORMAT,
                "Simulation Image A",
            ),
            TextureResource::create_simulation_image(
                device,
                width,
                height,
                IMAGE_FORMAT,
                "Simulation Image B",
            ),
        ];
        images[Slot::A.index()].upload_rgba(context.queue(), &seed.pixels);

        let kernel = context.kernel();
        let step_bind_groups = [
            create_step_bind_group(device, kernel, &images, Slot::A),
            create_step_bind_group(device, kernel, &images, Slot::B),
        ];

        log::info!("Allocated simulation images {}x{}", width, height);

        Ok(Self {
            images,
            step_bind_groups,
            roles: PingPong::new(),
            width,
            height,
        })
    }

    /// Run one kernel step and block until it has finished.
    ///
    /// Ownership of the pair moves to compute for the duration of the submission.
    /// Sampling work already on the queue completes before the kernel writes, since
    /// the queue executes submissions in order and inserts the usage barrier between
    /// the sampled and storage uses.
    pub fn iterate(&mut self, context: &ComputeContext) -> Result<()> {
        self.roles.acquire_for_compute()?;

        match self.dispatch(context) {
            Ok(()) => {
                self.roles.release_and_swap();
                log::debug!(
                    "Step {} complete, output now {:?}",
                    self.roles.generation(),
                    self.roles.output()
                );
                Ok(())
            }
            Err(err) => {
                self.roles.abandon();
                Err(err)
            }
        }
    }

    fn dispatch(&self, context: &ComputeContext) -> Result<()> {
        let device = context.device();
        let output = self.roles.output();

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Automata Step Encoder"),
        });

        {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Automata Step Pass"),
                timestamp_writes: None,
            });

            compute_pass.set_pipeline(context.kernel().pipeline());
            compute_pass.set_bind_group(0, &self.step_bind_groups[output.index()], &[]);

            let (groups_x, groups_y) = Kernel::workgroups(self.width, self.height);
            compute_pass.dispatch_workgroups(groups_x, groups_y, 1);
        }

        context.queue().submit(std::iter::once(encoder.finish()));

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(AutomataError::StepRejected(error.to_string()));
        }

        device.poll(wgpu::PollType::Wait)?;
        Ok(())
    }

    /// Image the renderer may sample: the last one written
    pub fn current_output(&self) -> &TextureResource {
        &self.images[self.roles.output().index()]
    }

    pub fn output_slot(&self) -> Slot {
        self.roles.output()
    }

    pub fn image(&self, slot: Slot) -> &TextureResource {
        &self.images[slot.index()]
    }

    /// Completed steps since creation
    pub fn generation(&self) -> u64 {
        self.roles.generation()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Copy the current output back to the host as RGBA8 rows, top row first
    pub fn read_output(&self, context: &ComputeContext) -> Result<Vec<u8>> {
        let device = context.device();
        let readback = ReadbackBuffer::new(device, self.width, self.height);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Automata Readback Encoder"),
        });
        readback.copy_from(&mut encoder, &self.current_output().texture);
        context.queue().submit(std::iter::once(encoder.finish()));

        readback.read(device)
    }
}

fn create_step_bind_group(
    device: &Device,
    kernel: &Kernel,
    images: &[TextureResource; 2],
    read_from: Slot,
) -> BindGroup {
    let write_to = read_from.other();
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(match read_from {
            Slot::A => "Automata Step A->B",
            Slot::B => "Automata Step B->A",
        }),
        layout: kernel.bind_group_layout(),
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&images[read_from.index()].view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&images[write_to.index()].view),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::compute_context::{KernelSource, DEFAULT_ENTRY_POINT};

    /// Inverts RGB each step, leaving alpha alone
    const INVERT_KERNEL: &str = r#"
@group(0) @binding(0) var input: texture_2d<f32>;
@group(0) @binding(1) var output: texture_storage_2d<rgba8unorm, write>;

@compute @workgroup_size(8, 8, 1)
fn iterate(@builtin(global_invocation_id) id: vec3<u32>) {
    let size = textureDimensions(input);
    if (id.x >= size.x || id.y >= size.y) {
        return;
    }
    let texel = textureLoad(input, vec2<i32>(id.xy), 0);
    textureStore(output, vec2<i32>(id.xy), vec4<f32>(vec3<f32>(1.0) - texel.rgb, texel.a));
}
"#;

    fn context() -> Option<ComputeContext> {
        let source = KernelSource::from_wgsl("invert", INVERT_KERNEL, DEFAULT_ENTRY_POINT);
        match ComputeContext::headless(&source) {
            Ok(context) => Some(context),
            Err(AutomataError::NoAdapter(_)) | Err(AutomataError::UnsupportedAdapter { .. }) => {
                eprintln!("skipping: no usable adapter");
                None
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_iterate_swaps_output_to_previous_input() {
        let Some(context) = context() else { return };
        let seed = SeedImage::uniform(4, 4, [200, 200, 200, 255]).unwrap();
        let mut images = SimulationImageSet::from_seed(&context, &seed).unwrap();

        assert_eq!(images.output_slot(), Slot::A);
        let written = images.roles.input();

        images.iterate(&context).unwrap();
        assert_eq!(images.output_slot(), written);
        assert_eq!(images.generation(), 1);
        assert_eq!(images.current_output().size(), (4, 4));
    }

    #[test]
    fn test_kernel_reads_output_and_writes_input() {
        let Some(context) = context() else { return };
        let seed = SeedImage::uniform(4, 4, [200, 100, 0, 255]).unwrap();
        let mut images = SimulationImageSet::from_seed(&context, &seed).unwrap();

        assert_eq!(images.read_output(&context).unwrap(), seed.pixels);

        images.iterate(&context).unwrap();
        let inverted = images.read_output(&context).unwrap();
        assert!(inverted.chunks(4).all(|p| p == [55, 155, 255, 255]));

        images.iterate(&context).unwrap();
        assert_eq!(images.output_slot(), Slot::A);
        assert_eq!(images.read_output(&context).unwrap(), seed.pixels);
    }

    #[test]
    fn test_odd_sized_grid_is_fully_covered() {
        let Some(context) = context() else { return };
        let seed = SeedImage::uniform(13, 5, [0, 0, 0, 255]).unwrap();
        let mut images = SimulationImageSet::from_seed(&context, &seed).unwrap();

        images.iterate(&context).unwrap();
        let pixels = images.read_output(&context).unwrap();
        assert_eq!(pixels.len(), 13 * 5 * 4);
        assert!(pixels.chunks(4).all(|p| p == [255, 255, 255, 255]));
    }

    #[test]
    fn test_create_with_undecodable_seed() {
        let Some(context) = context() else { return };
        let result = SimulationImageSet::create(&context, "does/not/exist.png");
        assert!(matches!(result, Err(AutomataError::SeedDecode { .. })));
    }
}
