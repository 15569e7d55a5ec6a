use std::{sync::Arc, thread::JoinHandle};

use crossbeam::channel::{Receiver, Sender};
use parking_lot::Mutex;

use super::renderer::Renderer;

enum Command {
    Render {
        model_view: [f32; 16],
        projection: [f32; 16],
    },
    ShutDown,
}

/// Presentation-side handle to a renderer running on its own worker thread.
///
/// The worker owns the [`Renderer`] and with it every device resource, so
/// texture rebinds stay between launches; the handle owns the command
/// channel and the shared buffer the worker publishes finished frames into,
/// stride padding already dropped.
pub struct RendererFront {
    handle: Option<JoinHandle<()>>,
    commands: Sender<Command>,
    finished: Receiver<()>,
    frame: Arc<Mutex<Vec<u8>>>,
}

impl RendererFront {
    /// Move the renderer onto a worker thread and hand back the front.
    pub fn spawn(mut renderer: Renderer) -> RendererFront {
        let (commands, command_rec) = crossbeam::channel::unbounded();
        let (finished_send, finished) = crossbeam::channel::unbounded();

        let elements = renderer.framebuffer().width() * renderer.framebuffer().height();
        let frame = Arc::new(Mutex::new(vec![0; elements * 4]));
        let shared = frame.clone();

        let handle = std::thread::spawn(move || {
            while let Ok(command) = command_rec.recv() {
                match command {
                    Command::Render {
                        model_view,
                        projection,
                    } => {
                        // a failed frame is already logged and leaves a
                        // black image, which still gets published
                        let _ = renderer.render(&model_view, &projection);

                        {
                            let mut buffer = shared.lock();
                            renderer.framebuffer().copy_visible_into(&mut buffer);
                        }

                        if finished_send.send(()).is_err() {
                            break;
                        }
                    }
                    Command::ShutDown => break,
                }
            }
        });

        RendererFront {
            handle: Some(handle),
            commands,
            finished,
            frame,
        }
    }

    /// Queue one frame from column-major model-view and projection matrices.
    /// Rendering is asynchronous; pair with [`RendererFront::wait_frame`].
    pub fn render(&self, model_view: [f32; 16], projection: [f32; 16]) {
        self.commands
            .send(Command::Render {
                model_view,
                projection,
            })
            .expect("render worker is gone");
    }

    /// Block until the frame in flight lands in the shared buffer.
    pub fn wait_frame(&self) {
        self.finished.recv().expect("render worker is gone");
    }

    /// Shared buffer the worker publishes finished frames into.
    pub fn frame_handle(&self) -> Arc<Mutex<Vec<u8>>> {
        self.frame.clone()
    }

    /// Stop the worker and wait for it to exit.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.commands.send(Command::ShutDown);
            handle.join().expect("render worker panicked");
        }
    }
}

impl Drop for RendererFront {
    fn drop(&mut self) {
        self.shutdown();
    }
}
