mod platform;

use glfw::{
  Action, Context as _, CursorMode, Key, Modifiers, MouseButton, SwapInterval, WindowEvent,
  WindowMode,
};
use learngl_scenes::{InputAction, LoopFeedback, Scene, SceneError};
use luminance_glfw::{GlfwSurface, GlfwSurfaceError};
use platform::{DesktopFetchError, DesktopPlatformServices};
use std::{error::Error, fmt, iter, path::PathBuf, process, time::Instant};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub struct CLIOpts {
  #[structopt(short, long, default_value = "media")]
  /// Directory where to pick textures from.
  textures: PathBuf,

  #[structopt(short, long, default_value = "media")]
  /// Directory where to pick models (and their textures) from.
  models: PathBuf,

  #[structopt(short, long)]
  /// List available scenes.
  list_scenes: bool,

  #[structopt(long, default_value = "800")]
  /// Width of the window.
  width: u32,

  #[structopt(long, default_value = "600")]
  /// Height of the window.
  height: u32,

  /// Scene to run.
  scene: Option<String>,
}

/// Keys polled every frame, emitting their action for as long as they are held.
const HELD_KEYS: [(Key, InputAction); 10] = [
  (Key::W, InputAction::Forward),
  (Key::S, InputAction::Backward),
  (Key::A, InputAction::Left),
  (Key::D, InputAction::Right),
  (Key::Space, InputAction::Up),
  (Key::LeftShift, InputAction::Down),
  (Key::Up, InputAction::Increase),
  (Key::RightBracket, InputAction::Increase),
  (Key::Down, InputAction::Decrease),
  (Key::LeftBracket, InputAction::Decrease),
];

/// Macro to declaratively add scenes.
macro_rules! scenes {
  ($($name:literal, $module:ident),* $(,)?) => {
    fn show_available_scenes() {
      println!("available scenes:");
      $( println!("  - {}", $name); )*
    }

    // create a function that will run a scene based on its name
    fn pick_and_run_scene(cli_opts: &CLIOpts) -> Result<(), AppError> {
      let scene_name = cli_opts.scene.as_ref().map(|n| n.as_str());
      match scene_name {
        $(
          Some($name) => {
            run_scene::<learngl_scenes::$module::LocalScene>(cli_opts, $name)
          }
        ),*

        _ => {
          log::error!("no scene found");
          show_available_scenes();
          Ok(())
        }
      }
    }
  }
}

#[derive(Debug)]
enum PlatformError {
  CannotCreateWindow,
}

impl fmt::Display for PlatformError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      PlatformError::CannotCreateWindow => f.write_str("cannot create window"),
    }
  }
}

impl Error for PlatformError {}

/// Everything that can stop a scene from running.
#[derive(Debug)]
enum AppError {
  Assets(DesktopFetchError),
  Surface(GlfwSurfaceError<PlatformError>),
  Bootstrap(SceneError),
  BackBuffer(String),
}

impl fmt::Display for AppError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      AppError::Assets(ref e) => write!(f, "cannot load assets: {}", e),
      AppError::Surface(ref e) => write!(f, "cannot create GLFW surface: {}", e),
      AppError::Bootstrap(ref e) => write!(f, "cannot bootstrap scene: {}", e),
      AppError::BackBuffer(ref e) => write!(f, "cannot get back buffer: {}", e),
    }
  }
}

impl Error for AppError {}

impl From<DesktopFetchError> for AppError {
  fn from(e: DesktopFetchError) -> Self {
    AppError::Assets(e)
  }
}

impl From<GlfwSurfaceError<PlatformError>> for AppError {
  fn from(e: GlfwSurfaceError<PlatformError>) -> Self {
    AppError::Surface(e)
  }
}

impl From<SceneError> for AppError {
  fn from(e: SceneError) -> Self {
    AppError::Bootstrap(e)
  }
}

// Run a scene.
fn run_scene<S>(cli_opts: &CLIOpts, name: &str) -> Result<(), AppError>
where
  S: Scene,
{
  // Check the features so that we know what we need to load.
  let features = S::features();
  let mut services = DesktopPlatformServices::new(cli_opts, &features)?;

  // First thing first: we create a new surface to render to and get events from.
  let (width, height) = (cli_opts.width, cli_opts.height);
  let surface = GlfwSurface::new(|glfw| {
    let (mut window, events) = glfw
      .create_window(width, height, name, WindowMode::Windowed)
      .ok_or(GlfwSurfaceError::UserError(PlatformError::CannotCreateWindow))?;

    window.make_current();
    window.set_all_polling(true);
    glfw.set_swap_interval(SwapInterval::Sync(1));

    Ok((window, events))
  })?;

  let mut context = surface.context;
  let events = surface.events_rx;

  if features.captures_cursor() {
    context.window.set_cursor_mode(CursorMode::Disabled);
  }

  log::info!("starting {}", name);
  let scene = S::bootstrap(&mut services, &mut context)?;
  let start_t = Instant::now();

  // render a first frame with a single action containing the initial framebuffer size; scenes start with a default
  // size that might not be the actual one
  let (fb_w, fb_h) = context.window.get_framebuffer_size();
  let back_buffer = context
    .back_buffer()
    .map_err(|e| AppError::BackBuffer(e.to_string()))?;
  let feedback = scene.render_frame(
    0.,
    back_buffer,
    iter::once(InputAction::Resized {
      width: fb_w as _,
      height: fb_h as _,
    }),
    &mut context,
  );
  let mut scene = match feedback {
    LoopFeedback::Exit => return Ok(()),
    LoopFeedback::Continue(scene) => scene,
  };

  'app: loop {
    // handle events
    context.window.glfw.poll_events();
    let held = held_actions(|key| context.window.get_key(key) == Action::Press);
    let actions = glfw::flush_messages(&events)
      .filter_map(|(_, event)| adapt_events(event))
      .chain(held);

    let back_buffer = context
      .back_buffer()
      .map_err(|e| AppError::BackBuffer(e.to_string()))?;
    let t = start_t.elapsed().as_secs_f32();
    let feedback = scene.render_frame(t, back_buffer, actions, &mut context);

    if let LoopFeedback::Continue(stepped) = feedback {
      scene = stepped;
      context.window.swap_buffers();
    } else {
      break 'app;
    }
  }

  log::info!("exiting {}", name);
  Ok(())
}

fn held_actions(is_pressed: impl Fn(Key) -> bool) -> Vec<InputAction> {
  HELD_KEYS
    .iter()
    .filter(|(key, _)| is_pressed(*key))
    .map(|(_, action)| action.clone())
    .collect()
}

fn adapt_events(event: WindowEvent) -> Option<InputAction> {
  match event {
    WindowEvent::Close | WindowEvent::Key(Key::Escape, _, Action::Release, _) => {
      Some(InputAction::Quit)
    }

    WindowEvent::Key(Key::Enter, _, Action::Release, mods) => {
      if mods.is_empty() {
        Some(InputAction::MainToggle)
      } else if mods == Modifiers::Shift {
        Some(InputAction::AuxiliaryToggle)
      } else {
        None
      }
    }

    WindowEvent::MouseButton(MouseButton::Button1, action, _) => match action {
      Action::Press => Some(InputAction::PrimaryPressed),
      Action::Release => Some(InputAction::PrimaryReleased),
      _ => None,
    },

    WindowEvent::CursorPos(x, y) => Some(InputAction::CursorMoved {
      x: x as _,
      y: y as _,
    }),

    WindowEvent::FramebufferSize(width, height) => {
      log::info!("framebuffer resized to {}×{}", width, height);
      Some(InputAction::Resized {
        width: width as _,
        height: height as _,
      })
    }

    WindowEvent::Scroll(_, amount) => Some(InputAction::VScroll {
      amount: amount as f32,
    }),

    _ => None,
  }
}

scenes! {
  "first-triangle", first_triangle,
  "rectangle", rectangle,
  "texture-mapping", texture_mapping,
  "transformations", transformations,
  "coordinate-systems", coordinate_systems,
  "basic-lighting", basic_lighting,
  "model-loading", model_loading,
  "stencil-outline", stencil_outline,
}

fn main() {
  env_logger::builder()
    .filter_level(log::LevelFilter::Info)
    .parse_default_env()
    .init();
  let cli_opts = CLIOpts::from_args();

  if cli_opts.list_scenes {
    show_available_scenes();
  } else if let Err(e) = pick_and_run_scene(&cli_opts) {
    log::error!("{}", e);
    process::exit(1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use glfw::Scancode;

  fn key(key: Key, action: Action, mods: Modifiers) -> WindowEvent {
    WindowEvent::Key(key, 0 as Scancode, action, mods)
  }

  #[test]
  fn escape_and_close_quit() {
    assert_eq!(adapt_events(WindowEvent::Close), Some(InputAction::Quit));
    assert_eq!(
      adapt_events(key(Key::Escape, Action::Release, Modifiers::empty())),
      Some(InputAction::Quit)
    );
    assert_eq!(
      adapt_events(key(Key::Escape, Action::Press, Modifiers::empty())),
      None
    );
  }

  #[test]
  fn enter_toggles() {
    assert_eq!(
      adapt_events(key(Key::Enter, Action::Release, Modifiers::empty())),
      Some(InputAction::MainToggle)
    );
    assert_eq!(
      adapt_events(key(Key::Enter, Action::Release, Modifiers::Shift)),
      Some(InputAction::AuxiliaryToggle)
    );
    assert_eq!(
      adapt_events(key(Key::Enter, Action::Release, Modifiers::Control)),
      None
    );
  }

  #[test]
  fn held_keys_are_not_events() {
    assert_eq!(
      adapt_events(key(Key::W, Action::Press, Modifiers::empty())),
      None
    );
    assert_eq!(
      adapt_events(key(Key::Space, Action::Release, Modifiers::empty())),
      None
    );
  }

  #[test]
  fn cursor_scroll_and_resize() {
    assert_eq!(
      adapt_events(WindowEvent::CursorPos(12.5, 40.)),
      Some(InputAction::CursorMoved { x: 12.5, y: 40. })
    );
    assert_eq!(
      adapt_events(WindowEvent::Scroll(3., -1.)),
      Some(InputAction::VScroll { amount: -1. })
    );
    assert_eq!(
      adapt_events(WindowEvent::FramebufferSize(1920, 1080)),
      Some(InputAction::Resized {
        width: 1920,
        height: 1080
      })
    );
    assert_eq!(
      adapt_events(WindowEvent::MouseButton(
        MouseButton::Button1,
        Action::Press,
        Modifiers::empty()
      )),
      Some(InputAction::PrimaryPressed)
    );
  }

  #[test]
  fn held_keys_repeat_every_frame() {
    let pressed = [Key::W, Key::LeftShift, Key::RightBracket];
    let actions = held_actions(|key| pressed.contains(&key));

    assert_eq!(
      actions,
      [
        InputAction::Forward,
        InputAction::Down,
        InputAction::Increase
      ]
    );
    assert!(held_actions(|_| false).is_empty());
  }

  #[test]
  fn cli_defaults() {
    let opts = CLIOpts::from_iter(&["learngl-scenes-desktop", "basic-lighting"]);

    assert_eq!(opts.textures, PathBuf::from("media"));
    assert_eq!(opts.models, PathBuf::from("media"));
    assert_eq!((opts.width, opts.height), (800, 600));
    assert_eq!(opts.scene.as_deref(), Some("basic-lighting"));
    assert!(!opts.list_scenes);
  }
}
