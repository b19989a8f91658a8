//! Stage masks and translation from API pipeline stages.

use crate::job::JobType;

bitflags::bitflags! {
    /// Set of execution stages.
    ///
    /// Used as "wait for completion of these stages" on the source side of a
    /// dependency and as "these stages must wait" on the destination side.
    #[repr(transparent)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StageMask: u32 {
        /// Geometry execution context.
        const GEOMETRY = 0x01;

        /// Fragment execution context.
        const FRAGMENT = 0x02;

        /// Compute execution context.
        const COMPUTE = 0x04;

        /// Transfer execution context.
        const TRANSFER = 0x08;

        /// Occlusion query execution context.
        /// Never named by API stage masks, only by implicit barriers.
        const OCCLUSION_QUERY = 0x10;

        /// Host pseudo-stage. Has no execution context.
        const HOST = 0x20;

        /// Both halves of a render.
        const ALL_GRAPHICS = Self::GEOMETRY.bits | Self::FRAGMENT.bits;

        /// Every stage an API stage mask can resolve to.
        const ALL_SYNC = Self::GEOMETRY.bits
            | Self::FRAGMENT.bits
            | Self::COMPUTE.bits
            | Self::TRANSFER.bits;

        /// Every stage backed by an execution context.
        const ALL_JOBS = Self::ALL_SYNC.bits | Self::OCCLUSION_QUERY.bits;
    }
}

impl StageMask {
    /// Iterate over job types whose bit is set.
    /// Bits without an execution context are skipped.
    pub fn job_types(self) -> impl Iterator<Item = JobType> {
        JobType::ALL
            .iter()
            .copied()
            .filter(move |job| self.contains(job.stage()))
    }

    /// Check if the job type's bit is set.
    #[inline]
    pub fn has(self, job: JobType) -> bool {
        self.contains(job.stage())
    }

    /// Translate API stages used as the source of a dependency.
    pub fn from_src_stages(stages: PipelineStageFlags) -> Self {
        if stages.contains(PipelineStageFlags::BOTTOM_OF_PIPE) {
            return StageMask::ALL_SYNC;
        }
        Self::from_stages(stages)
    }

    /// Translate API stages used as the destination of a dependency.
    pub fn from_dst_stages(stages: PipelineStageFlags) -> Self {
        if stages.contains(PipelineStageFlags::TOP_OF_PIPE) {
            return StageMask::ALL_SYNC;
        }
        Self::from_stages(stages)
    }

    fn from_stages(stages: PipelineStageFlags) -> Self {
        if stages.contains(PipelineStageFlags::ALL_COMMANDS) {
            return StageMask::ALL_SYNC;
        }

        let mut mask = StageMask::empty();

        if stages.contains(PipelineStageFlags::ALL_GRAPHICS) {
            mask |= StageMask::ALL_GRAPHICS;
        }

        if stages.intersects(PipelineStageFlags::GEOMETRY_STAGES) {
            mask |= StageMask::GEOMETRY;
        }

        if stages.intersects(PipelineStageFlags::FRAGMENT_STAGES) {
            mask |= StageMask::FRAGMENT;
        }

        if stages.intersects(PipelineStageFlags::DRAW_INDIRECT | PipelineStageFlags::COMPUTE_SHADER) {
            mask |= StageMask::COMPUTE;
        }

        if stages.contains(PipelineStageFlags::TRANSFER) {
            mask |= StageMask::TRANSFER;
        }

        if stages.contains(PipelineStageFlags::HOST) {
            mask |= StageMask::HOST;
        }

        mask
    }
}

bitflags::bitflags! {
    /// API pipeline stages as recorded by the application.
    /// See Vulkan docs for detailed info:
    /// <https://www.khronos.org/registry/vulkan/specs/1.1-extensions/man/html/VkPipelineStageFlagBits.html>
    #[repr(transparent)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PipelineStageFlags: u32 {
        /// Start of the pipeline.
        const TOP_OF_PIPE = 0x00000001;
        /// Indirect draw and dispatch parameters are read.
        const DRAW_INDIRECT = 0x00000002;
        /// Vertex and index buffers are read.
        const VERTEX_INPUT = 0x00000004;
        /// Vertex shader.
        const VERTEX_SHADER = 0x00000008;
        /// Tessellation control shader.
        const TESSELLATION_CONTROL_SHADER = 0x00000010;
        /// Tessellation evaluation shader.
        const TESSELLATION_EVALUATION_SHADER = 0x00000020;
        /// Geometry shader.
        const GEOMETRY_SHADER = 0x00000040;
        /// Fragment shader.
        const FRAGMENT_SHADER = 0x00000080;
        /// Depth and stencil tests before fragment shading.
        const EARLY_FRAGMENT_TESTS = 0x00000100;
        /// Depth and stencil tests after fragment shading.
        const LATE_FRAGMENT_TESTS = 0x00000200;
        /// Blended color values are written.
        const COLOR_ATTACHMENT_OUTPUT = 0x00000400;
        /// Compute shader.
        const COMPUTE_SHADER = 0x00000800;
        /// Copies, blits, resolves and clears.
        const TRANSFER = 0x00001000;
        /// End of the pipeline.
        const BOTTOM_OF_PIPE = 0x00002000;
        /// Host access. Not a device stage.
        const HOST = 0x00004000;
        /// Every graphics stage.
        const ALL_GRAPHICS = 0x00008000;
        /// Every stage of every command.
        const ALL_COMMANDS = 0x00010000;

        /// Stages that run on the geometry context.
        const GEOMETRY_STAGES = Self::DRAW_INDIRECT.bits
            | Self::VERTEX_INPUT.bits
            | Self::VERTEX_SHADER.bits
            | Self::TESSELLATION_CONTROL_SHADER.bits
            | Self::TESSELLATION_EVALUATION_SHADER.bits
            | Self::GEOMETRY_SHADER.bits;

        /// Stages that run on the fragment context.
        const FRAGMENT_STAGES = Self::FRAGMENT_SHADER.bits
            | Self::EARLY_FRAGMENT_TESTS.bits
            | Self::LATE_FRAGMENT_TESTS.bits
            | Self::COLOR_ATTACHMENT_OUTPUT.bits;
    }
}
