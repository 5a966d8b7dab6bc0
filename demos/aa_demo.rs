//! Antialiasing demo.
//!
//! Builds the same scene three times with different antialiasing setups and
//! replays a few frames of each against the recording [`NullRenderer`]:
//!
//! - **MSAA**: multisampled scene target resolved straight onto the swapchain
//! - **FXAA**: post pass sampling the scene through an sRGB reinterpreting view
//! - **TAA**: history accumulation with a double-buffered pair of externally
//!   owned history images
//!
//! Run with `RUST_LOG=debug` to see the compiled schedules and every backend
//! call the frames issue.

use std::cell::Cell;
use std::rc::Rc;

use framegraph::{
    ClearColor, ColorAttachment, GraphError, GraphId, ImageLayout, NullRenderer, PassDesc,
    PipelineDesc, PipelineHandle, RenderGraph, RenderTargetDesc, TextureFormat,
};

const WIDTH: u32 = 1920;
const HEIGHT: u32 = 1080;
const FRAMES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Rt {
    Invalid,
    SceneMsaa,
    SceneColor,
    Resolved,
    HistoryRead,
    HistoryWrite,
    Backbuffer,
}

impl GraphId for Rt {
    fn sentinel() -> Self {
        Rt::Invalid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Rp {
    Invalid,
    Scene,
    Fxaa,
    Taa,
    Present,
}

impl GraphId for Rp {
    fn sentinel() -> Self {
        Rp::Invalid
    }
}

fn main() -> Result<(), GraphError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    framegraph::init();

    let mut renderer = NullRenderer::new();
    msaa_demo(&mut renderer)?;
    fxaa_demo(&mut renderer)?;
    taa_demo(&mut renderer)?;

    log::info!(
        "done: {} frames presented in total",
        renderer.frames_presented()
    );
    Ok(())
}

fn log_schedule(name: &str, graph: &RenderGraph<Rt, Rp>) {
    log::info!("{name}: compiled schedule ({} operations)", graph.operation_count());
    for (index, op) in graph.operations().iter().enumerate() {
        log::info!("  [{index}] {}", op.name());
    }
}

/// Multisampled scene resolved directly onto the presentable surface.
fn msaa_demo(renderer: &mut NullRenderer) -> Result<(), GraphError> {
    let mut graph = RenderGraph::new();
    graph.render_target(
        Rt::SceneMsaa,
        RenderTargetDesc::new(WIDTH, HEIGHT, TextureFormat::Rgba8Unorm)
            .with_samples(4)
            .with_label("scene msaa"),
    );
    graph.render_target(
        Rt::Backbuffer,
        RenderTargetDesc::new(WIDTH, HEIGHT, TextureFormat::Bgra8Unorm).with_label("backbuffer"),
    );
    graph.render_pass(
        Rp::Scene,
        "scene",
        PassDesc::new()
            .with_color(ColorAttachment::new(Rt::SceneMsaa).with_clear(ClearColor::BLACK))
            .with_samples(4),
        |_renderer, _id, _resources| Ok(()),
    );
    graph.resolve_msaa(Rt::SceneMsaa, Rt::Backbuffer);
    graph.present_render_target(Rt::Backbuffer);

    graph.build(renderer)?;
    log_schedule("msaa", &graph);
    for _ in 0..FRAMES {
        graph.render(renderer)?;
    }
    graph.reset(renderer);
    Ok(())
}

/// FXAA wants perceptual luma, so the post pass samples the scene through an
/// sRGB view of the same image. Also exercises the pipeline cache: the post
/// pipeline is requested every frame and created exactly once.
fn fxaa_demo(renderer: &mut NullRenderer) -> Result<(), GraphError> {
    let mut graph = RenderGraph::new();
    graph.render_target(
        Rt::SceneColor,
        RenderTargetDesc::new(WIDTH, HEIGHT, TextureFormat::Rgba8Unorm)
            .with_extra_view_format(TextureFormat::Rgba8UnormSrgb)
            .with_label("scene color"),
    );
    graph.render_target(
        Rt::Backbuffer,
        RenderTargetDesc::new(WIDTH, HEIGHT, TextureFormat::Bgra8Unorm).with_label("backbuffer"),
    );
    graph.render_pass(
        Rp::Scene,
        "scene",
        PassDesc::new()
            .with_color(ColorAttachment::new(Rt::SceneColor).with_clear(ClearColor::BLACK)),
        |_renderer, _id, _resources| Ok(()),
    );

    let fxaa_pipeline: Rc<Cell<PipelineHandle>> = Rc::new(Cell::new(PipelineHandle::NULL));
    let pipeline_slot = fxaa_pipeline.clone();
    graph.render_pass(
        Rp::Fxaa,
        "fxaa",
        PassDesc::new()
            .with_color(ColorAttachment::new(Rt::Backbuffer))
            .with_input(Rt::SceneColor),
        move |_renderer, _id, resources| {
            let srgb_view = resources.get_view(Rt::SceneColor, TextureFormat::Rgba8UnormSrgb);
            let pipeline = pipeline_slot.get();
            if pipeline.is_null() {
                return Err(GraphError::callback("fxaa pipeline was not prepared"));
            }
            log::debug!("fxaa: pipeline {pipeline:?} sampling sRGB view {srgb_view:?}");
            Ok(())
        },
    );
    graph.present_render_target(Rt::Backbuffer);

    graph.build(renderer)?;
    log_schedule("fxaa", &graph);

    let fxaa_pass = graph.operations()[1]
        .as_render_pass()
        .expect("fxaa pass")
        .pass_handle();
    let desc = PipelineDesc::new("fullscreen", "fxaa", fxaa_pass).with_label("fxaa");
    for _ in 0..FRAMES {
        fxaa_pipeline.set(graph.get_or_create_pipeline(renderer, &desc)?);
        graph.render(renderer)?;
    }
    log::info!("fxaa: {} pipeline(s) created", renderer.pipelines_created());
    graph.reset(renderer);
    Ok(())
}

/// Temporal AA with a double-buffered history pair owned by the application:
/// each frame reads one history image and blits the fresh result into the
/// other, then the two swap roles.
fn taa_demo(renderer: &mut NullRenderer) -> Result<(), GraphError> {
    let mut graph = RenderGraph::new();
    graph.render_target(
        Rt::SceneColor,
        RenderTargetDesc::new(WIDTH, HEIGHT, TextureFormat::Rgba8Unorm).with_label("scene color"),
    );
    graph.render_target(
        Rt::Resolved,
        RenderTargetDesc::new(WIDTH, HEIGHT, TextureFormat::Rgba8Unorm).with_label("taa resolved"),
    );
    graph.render_target(
        Rt::Backbuffer,
        RenderTargetDesc::new(WIDTH, HEIGHT, TextureFormat::Bgra8Unorm).with_label("backbuffer"),
    );
    graph.external_render_target(
        Rt::HistoryRead,
        TextureFormat::Rgba8Unorm,
        ImageLayout::ShaderRead,
        ImageLayout::ShaderRead,
    );
    graph.external_render_target(
        Rt::HistoryWrite,
        TextureFormat::Rgba8Unorm,
        ImageLayout::Undefined,
        ImageLayout::ShaderRead,
    );

    graph.render_pass(
        Rp::Scene,
        "scene",
        PassDesc::new()
            .with_color(ColorAttachment::new(Rt::SceneColor).with_clear(ClearColor::BLACK)),
        |_renderer, _id, _resources| Ok(()),
    );
    graph.render_pass(
        Rp::Taa,
        "taa resolve",
        PassDesc::new()
            .with_color(ColorAttachment::new(Rt::Resolved).with_clear(ClearColor::BLACK))
            .with_input(Rt::SceneColor)
            .with_input(Rt::HistoryRead),
        |_renderer, _id, resources| {
            log::debug!(
                "taa: blending {:?} with history {:?}",
                resources.get(Rt::SceneColor),
                resources.get(Rt::HistoryRead)
            );
            Ok(())
        },
    );
    graph.render_pass(
        Rp::Present,
        "present",
        PassDesc::new()
            .with_color(ColorAttachment::new(Rt::Backbuffer))
            .with_input(Rt::Resolved),
        |_renderer, _id, _resources| Ok(()),
    );
    graph.blit(Rt::Resolved, Rt::HistoryWrite);
    graph.present_render_target(Rt::Backbuffer);

    graph.build(renderer)?;
    log_schedule("taa", &graph);

    let history = [
        renderer.create_external_target(
            RenderTargetDesc::new(WIDTH, HEIGHT, TextureFormat::Rgba8Unorm)
                .with_label("taa history 0"),
        ),
        renderer.create_external_target(
            RenderTargetDesc::new(WIDTH, HEIGHT, TextureFormat::Rgba8Unorm)
                .with_label("taa history 1"),
        ),
    ];
    for frame in 0..FRAMES {
        graph.bind_external_rt(Rt::HistoryRead, history[frame % 2]);
        graph.bind_external_rt(Rt::HistoryWrite, history[(frame + 1) % 2]);
        graph.render(renderer)?;
    }
    graph.reset(renderer);
    Ok(())
}
