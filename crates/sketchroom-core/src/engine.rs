//! The drawing engine: one canvas surface bound to one room.
//!
//! The engine owns the scene, camera, tool state, history and connection
//! channel. The host forwards pointer, wheel and key events and polls the
//! channel; the engine redraws the surface after every state change.
//!
//! Local edits are applied optimistically and sent on commit. Inbound edits
//! from peers replace or remove shapes by identity and never enter history.

use crate::camera::Camera;
use crate::channel::{Channel, ChannelEvent};
use crate::history::{History, HistoryState};
use crate::input::{KeyEvent, MouseButton, PointerEvent, Shortcut};
use crate::protocol::{ClientMessage, ServerMessage, ShapeEvent};
use crate::render::{RenderContext, Surface, render_frame};
use crate::scene::Scene;
use crate::selection::{Action, Handle, handle_at};
use crate::shape_source::ShapeSource;
use crate::shapes::{Shape, ShapeId, Text};
use crate::tools::{CursorIcon, TextEdit, ToolKind, ToolManager, ToolState};
use kurbo::Point;

/// Engine settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Room the engine edits.
    pub room_id: String,
    /// Eraser diameter in screen pixels.
    pub eraser_size: f64,
    /// Initial color for new shapes.
    pub default_color: String,
    /// Canvas background color.
    pub background: String,
    /// Maximum number of history snapshots, unbounded when `None`.
    pub history_limit: Option<usize>,
}

impl EngineConfig {
    pub fn new(room_id: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            eraser_size: 20.0,
            default_color: "#ffffff".to_string(),
            background: "rgb(18, 18, 18)".to_string(),
            history_limit: None,
        }
    }
}

type HistoryListener = Box<dyn FnMut(HistoryState)>;
type TextEditListener = Box<dyn FnMut(&TextEdit)>;

/// Client-side controller for one canvas in one room.
pub struct DrawingEngine<S: Surface, C: Channel> {
    config: EngineConfig,
    surface: S,
    channel: C,
    scene: Scene,
    camera: Camera,
    tools: ToolManager,
    history: History,
    selected: Option<ShapeId>,
    /// Last pointer position in screen pixels.
    pointer: Option<Point>,
    attached: bool,
    on_history_change: Option<HistoryListener>,
    on_text_edit: Option<TextEditListener>,
}

impl<S: Surface, C: Channel> DrawingEngine<S, C> {
    /// Create an engine over `initial` shapes. The seeded scene becomes the
    /// first history snapshot.
    pub fn new(config: EngineConfig, surface: S, channel: C, initial: Vec<Shape>) -> Self {
        let scene = Scene::from_shapes(initial);
        let mut history = History::with_limit(config.history_limit);
        history.save(&scene);
        log::info!(
            "Drawing engine attached to room {} with {} shapes",
            config.room_id,
            scene.len()
        );

        let mut engine = Self {
            camera: Camera::centered(surface.size()),
            tools: ToolManager::new(config.default_color.clone()),
            config,
            surface,
            channel,
            scene,
            history,
            selected: None,
            pointer: None,
            attached: true,
            on_history_change: None,
            on_text_edit: None,
        };
        engine.render();
        engine
    }

    /// Fetch the room's persisted shapes, then create the engine over them.
    pub async fn connect(
        config: EngineConfig,
        surface: S,
        channel: C,
        source: &dyn ShapeSource,
    ) -> Self {
        let shapes = source.fetch_shapes(&config.room_id).await;
        Self::new(config, surface, channel, shapes)
    }

    /// Called with the new undo/redo availability after every history change.
    pub fn set_history_listener(&mut self, listener: impl FnMut(HistoryState) + 'static) {
        self.on_history_change = Some(Box::new(listener));
    }

    /// Called when a text click asks the host to open an input overlay.
    pub fn set_text_edit_listener(&mut self, listener: impl FnMut(&TextEdit) + 'static) {
        self.on_text_edit = Some(Box::new(listener));
    }

    pub fn room_id(&self) -> &str {
        &self.config.room_id
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn tool(&self) -> ToolKind {
        self.tools.current_tool
    }

    pub fn color(&self) -> &str {
        &self.tools.color
    }

    pub fn history_state(&self) -> HistoryState {
        self.history.state()
    }

    pub fn selected_shape(&self) -> Option<&Shape> {
        self.selected.as_deref().and_then(|id| self.scene.get(id))
    }

    pub fn text_edit(&self) -> Option<&TextEdit> {
        self.tools.text_edit()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.camera.screen_to_world(screen)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        self.camera.world_to_screen(world)
    }

    /// Switch tools. An open text edit is committed first; any selection and
    /// gesture are dropped.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if !self.attached {
            return;
        }
        if let Some(edit) = self.tools.set_tool(tool) {
            self.add_text(&edit.buffer, edit.world);
        }
        self.selected = None;
        self.render();
    }

    pub fn set_color(&mut self, color: impl Into<String>) {
        self.tools.color = color.into();
    }

    /// Pointer cursor for the current tool and hover target.
    pub fn cursor(&self) -> CursorIcon {
        let hover = match (self.tools.current_tool, self.pointer) {
            (ToolKind::Select, Some(pointer)) => {
                let world = self.screen_to_world(pointer);
                self.selected_shape()
                    .and_then(|s| handle_at(s, world, self.camera.zoom(), &self.surface))
                    .or_else(|| {
                        self.scene
                            .shape_at(world, &self.surface)
                            .map(|_| Handle::Body)
                    })
            }
            _ => None,
        };
        self.tools.cursor(hover)
    }

    /// Create a text shape at `world`. Blank text is ignored.
    pub fn add_text(&mut self, text: &str, world: Point) -> Option<ShapeId> {
        if !self.attached || text.trim().is_empty() {
            return None;
        }
        let shape = Shape::Text(Text::new(world, text, &self.tools.color));
        Some(self.commit_new_shape(shape))
    }

    /// Replace the contents of the open text edit.
    pub fn update_text(&mut self, text: &str) -> bool {
        self.attached && self.tools.set_text_buffer(text)
    }

    /// Commit the open text edit.
    pub fn commit_text(&mut self) -> Option<ShapeId> {
        let edit = self.tools.take_text_edit()?;
        self.add_text(&edit.buffer, edit.world)
    }

    /// Close the open text edit without creating a shape.
    pub fn cancel_text(&mut self) {
        self.tools.take_text_edit();
    }

    pub fn undo(&mut self) {
        if !self.attached {
            return;
        }
        if let Some((scene, state)) = self.history.undo() {
            self.restore(scene, state);
        }
    }

    pub fn redo(&mut self) {
        if !self.attached {
            return;
        }
        if let Some((scene, state)) = self.history.redo() {
            self.restore(scene, state);
        }
    }

    fn restore(&mut self, scene: Scene, state: HistoryState) {
        self.scene = scene;
        self.tools.cancel();
        self.drop_stale_selection();
        self.notify_history(state);
        self.render();
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if !self.attached {
            return;
        }
        match event {
            PointerEvent::Down { position, button } => self.pointer_down(position, button),
            PointerEvent::Move { position } => self.pointer_move(position),
            PointerEvent::Up { position, .. } => self.pointer_up(position),
            PointerEvent::Wheel {
                position,
                delta,
                modifiers,
            } => {
                self.camera.apply_wheel(position, delta, modifiers.ctrl);
                self.render();
            }
        }
    }

    pub fn handle_key(&mut self, event: KeyEvent) {
        // Keys go to the overlay while text is being typed.
        if !self.attached || self.tools.text_edit().is_some() {
            return;
        }
        match event.shortcut() {
            Some(Shortcut::Undo) => self.undo(),
            Some(Shortcut::Redo) => self.redo(),
            Some(Shortcut::PanHoldStart) => self.tools.set_pan_hold(true),
            Some(Shortcut::PanHoldEnd) => {
                self.tools.set_pan_hold(false);
                if matches!(self.tools.state, ToolState::Panning { .. }) {
                    self.tools.state = ToolState::Idle;
                }
            }
            None => {}
        }
    }

    fn pointer_down(&mut self, position: Point, button: MouseButton) {
        self.pointer = Some(position);
        if self.tools.pans_with(button) {
            self.tools.begin_pan(position, self.camera.offset);
            return;
        }
        if button == MouseButton::Right {
            return;
        }

        let world = self.screen_to_world(position);
        match self.tools.current_tool {
            ToolKind::Select => {
                let zoom = self.camera.zoom();
                let grabbed = self
                    .selected_shape()
                    .and_then(|s| handle_at(s, world, zoom, &self.surface).map(|h| (s, h)))
                    .or_else(|| {
                        self.scene
                            .shape_at(world, &self.surface)
                            .map(|s| (s, Handle::Body))
                    })
                    .map(|(shape, handle)| Action::begin(shape, handle, world));

                self.selected = grabbed.as_ref().map(|a| a.shape_id.clone());
                self.tools.state = match grabbed {
                    Some(action) => ToolState::Transforming(action),
                    None => ToolState::Idle,
                };
                self.render();
            }
            ToolKind::Text => {
                if self.tools.text_edit().is_none() {
                    self.tools.state = ToolState::TextPress;
                }
            }
            ToolKind::Eraser => {
                self.tools.state = ToolState::Erasing;
                self.erase_at(world);
                self.render();
            }
            ToolKind::Pan => {}
            _ => self.tools.begin_drawing(world),
        }
    }

    fn pointer_move(&mut self, position: Point) {
        self.pointer = Some(position);
        let world = self.screen_to_world(position);

        if let ToolState::Transforming(action) = &self.tools.state {
            if let Some(shape) = self.scene.get_mut(&action.shape_id) {
                action.apply(shape, world);
            }
        } else if let ToolState::Panning { grab } = self.tools.state {
            self.camera.offset = position.to_vec2() - grab;
        } else if matches!(self.tools.state, ToolState::Erasing) {
            self.erase_at(world);
        } else if matches!(self.tools.state, ToolState::Drawing { .. }) {
            self.tools.update_drawing(world);
        } else if self.tools.current_tool != ToolKind::Eraser {
            // Hover only; the eraser preview follows the pointer.
            return;
        }
        self.render();
    }

    fn pointer_up(&mut self, position: Point) {
        self.pointer = Some(position);
        let world = self.screen_to_world(position);

        if matches!(self.tools.state, ToolState::Drawing { .. }) {
            if let Some(shape) = self.tools.finish_drawing(world) {
                self.commit_new_shape(shape);
            }
            self.render();
            return;
        }

        match std::mem::take(&mut self.tools.state) {
            ToolState::Transforming(action) => {
                let Some(shape) = self.scene.get(&action.shape_id).cloned() else {
                    return;
                };
                if shape != action.initial {
                    self.broadcast(ShapeEvent::Upsert(shape));
                    self.save_history();
                }
                self.render();
            }
            ToolState::TextPress => {
                let edit = self.tools.open_text_edit(world, position).clone();
                if let Some(listener) = &mut self.on_text_edit {
                    listener(&edit);
                }
            }
            ToolState::Panning { .. }
            | ToolState::Erasing
            | ToolState::Drawing { .. }
            | ToolState::Idle => {}
        }
    }

    fn commit_new_shape(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id().to_string();
        self.scene.upsert(shape.clone());
        self.broadcast(ShapeEvent::Upsert(shape));
        self.save_history();
        self.render();
        id
    }

    /// Remove every shape under the eraser at `world`, sending one erase per
    /// shape and saving history once.
    fn erase_at(&mut self, world: Point) {
        let tolerance = self.config.eraser_size / 2.0 / self.camera.zoom();
        let removed = self.scene.remove_near(world, tolerance, &self.surface);
        if removed.is_empty() {
            return;
        }
        for shape in removed {
            self.broadcast(ShapeEvent::Erase(shape.id().to_string()));
        }
        self.drop_stale_selection();
        self.save_history();
    }

    fn drop_stale_selection(&mut self) {
        let stale = match &self.selected {
            Some(id) => !self.scene.contains(id),
            None => false,
        };
        if stale {
            self.selected = None;
            if matches!(self.tools.state, ToolState::Transforming(_)) {
                self.tools.state = ToolState::Idle;
            }
        }
    }

    fn save_history(&mut self) {
        let state = self.history.save(&self.scene);
        self.notify_history(state);
    }

    fn notify_history(&mut self, state: HistoryState) {
        if let Some(listener) = &mut self.on_history_change {
            listener(state);
        }
    }

    fn broadcast(&mut self, event: ShapeEvent) {
        let frame = ClientMessage::chat(&self.config.room_id, &event).and_then(|m| m.to_json());
        match frame {
            Ok(frame) => {
                if let Err(e) = self.channel.send(frame) {
                    log::warn!("Dropped outgoing edit: {e}");
                }
            }
            Err(e) => log::error!("Failed to encode edit: {e}"),
        }
    }

    /// Drain the channel and apply inbound edits.
    pub fn poll_channel(&mut self) {
        if !self.attached {
            return;
        }
        for event in self.channel.poll_events() {
            match event {
                ChannelEvent::Message(frame) => self.handle_frame(&frame),
                ChannelEvent::Connected => log::info!("Connected to room {}", self.config.room_id),
                ChannelEvent::Closed { code, reason } => {
                    log::warn!("Connection closed ({code:?}): {reason}");
                }
                ChannelEvent::Error(e) => log::error!("Connection error: {e}"),
            }
        }
    }

    /// Apply one server frame. Malformed frames are logged and dropped.
    pub fn handle_frame(&mut self, frame: &str) {
        if !self.attached {
            return;
        }
        let event = ServerMessage::from_json(frame).and_then(|msg| match msg {
            ServerMessage::Chat { message } => ShapeEvent::decode(&message),
        });
        match event {
            Ok(event) => self.apply_remote(event),
            Err(e) => log::warn!("Ignoring inbound frame: {e}"),
        }
    }

    fn apply_remote(&mut self, event: ShapeEvent) {
        match event {
            ShapeEvent::Upsert(shape) => self.scene.upsert(shape),
            ShapeEvent::Erase(id) => {
                self.scene.remove(&id);
                self.drop_stale_selection();
            }
        }
        self.render();
    }

    /// Redraw the whole frame.
    pub fn render(&mut self) {
        if !self.attached {
            return;
        }
        let preview = self.tools.preview_shape();
        let eraser = match (self.tools.current_tool, self.pointer) {
            (ToolKind::Eraser, Some(pointer)) => Some((pointer, self.config.eraser_size)),
            _ => None,
        };
        let ctx = RenderContext {
            scene: &self.scene,
            camera: &self.camera,
            background: &self.config.background,
            selected: self.selected.as_deref().and_then(|id| self.scene.get(id)),
            preview: preview.as_ref(),
            eraser,
        };
        render_frame(&mut self.surface, &ctx);
    }

    /// Detach from the surface and channel. Later events are ignored and the
    /// listeners are dropped.
    pub fn teardown(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.on_history_change = None;
        self.on_text_edit = None;
        self.tools.cancel();
        log::info!("Drawing engine detached from room {}", self.config.room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::LoopbackChannel;
    use crate::input::Modifiers;
    use crate::render::DisplayList;
    use crate::shape_source::StaticShapeSource;
    use crate::shapes::Rectangle;
    use kurbo::{Size, Vec2};
    use std::cell::RefCell;
    use std::rc::Rc;

    type TestEngine = DrawingEngine<DisplayList, LoopbackChannel>;

    fn engine_with(shapes: Vec<Shape>) -> (TestEngine, LoopbackChannel) {
        let remote = LoopbackChannel::new();
        let engine = DrawingEngine::new(
            EngineConfig::new("abc"),
            DisplayList::new(Size::new(800.0, 600.0)),
            remote.clone(),
            shapes,
        );
        (engine, remote)
    }

    fn rect_shape(id: &str, x: f64, y: f64, w: f64, h: f64) -> Shape {
        let mut rect = Rectangle::new(Point::new(x, y), w, h, "#fff");
        rect.id = id.to_string();
        Shape::Rectangle(rect)
    }

    fn down(engine: &mut TestEngine, world: (f64, f64)) {
        let position = engine.world_to_screen(Point::new(world.0, world.1));
        engine.handle_pointer(PointerEvent::Down {
            position,
            button: MouseButton::Left,
        });
    }

    fn drag_to(engine: &mut TestEngine, world: (f64, f64)) {
        let position = engine.world_to_screen(Point::new(world.0, world.1));
        engine.handle_pointer(PointerEvent::Move { position });
    }

    fn up(engine: &mut TestEngine, world: (f64, f64)) {
        let position = engine.world_to_screen(Point::new(world.0, world.1));
        engine.handle_pointer(PointerEvent::Up {
            position,
            button: MouseButton::Left,
        });
    }

    fn sent_events(remote: &LoopbackChannel) -> Vec<ShapeEvent> {
        remote
            .take_sent()
            .iter()
            .map(|frame| match ClientMessage::from_json(frame).unwrap() {
                ClientMessage::Chat { room_id, message } => {
                    assert_eq!(room_id, "abc");
                    ShapeEvent::decode(&message).unwrap()
                }
                other => panic!("unexpected frame {other:?}"),
            })
            .collect()
    }

    fn record_history(engine: &mut TestEngine) -> Rc<RefCell<Vec<HistoryState>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        engine.set_history_listener(move |state| sink.borrow_mut().push(state));
        log
    }

    fn chat_frame(event: &ShapeEvent) -> String {
        ServerMessage::Chat {
            message: event.encode().unwrap(),
        }
        .to_json()
        .unwrap()
    }

    #[test]
    fn test_construction_seeds_scene_and_snapshot() {
        let (engine, remote) = engine_with(vec![rect_shape("s1", 0.0, 0.0, 10.0, 10.0)]);
        assert_eq!(engine.scene().len(), 1);
        assert_eq!(engine.history_state(), HistoryState::default());
        assert_eq!(engine.surface().frame_count(), 1);
        assert_eq!(engine.camera().offset, Vec2::new(400.0, 300.0));
        assert!(remote.sent().is_empty());
    }

    #[test]
    fn test_draw_rectangle_commits_once() {
        let (mut engine, remote) = engine_with(Vec::new());
        let history = record_history(&mut engine);
        engine.set_tool(ToolKind::Rectangle);
        engine.set_color("#f00");

        down(&mut engine, (10.0, 10.0));
        drag_to(&mut engine, (20.0, 20.0));
        drag_to(&mut engine, (40.0, 30.0));
        assert!(engine.scene().is_empty());
        assert!(remote.sent().is_empty());
        up(&mut engine, (40.0, 30.0));

        let [Shape::Rectangle(rect)] = engine.scene().all() else {
            panic!("expected one rectangle");
        };
        assert_eq!(rect.as_rect(), kurbo::Rect::new(10.0, 10.0, 40.0, 30.0));
        assert_eq!(rect.color, "#f00");
        assert_eq!(
            sent_events(&remote),
            vec![ShapeEvent::Upsert(engine.scene().all()[0].clone())]
        );
        assert_eq!(
            *history.borrow(),
            vec![HistoryState {
                can_undo: true,
                can_redo: false
            }]
        );
    }

    #[test]
    fn test_preview_is_drawn_during_drag() {
        let (mut engine, _remote) = engine_with(Vec::new());
        engine.set_tool(ToolKind::Ellipse);
        down(&mut engine, (0.0, 0.0));
        drag_to(&mut engine, (30.0, 30.0));
        let strokes = engine
            .surface()
            .commands()
            .iter()
            .filter(|c| matches!(c, crate::render::DrawCommand::StrokePath { .. }))
            .count();
        assert_eq!(strokes, 1);
    }

    #[test]
    fn test_pencil_click_is_dropped() {
        let (mut engine, remote) = engine_with(Vec::new());
        engine.set_tool(ToolKind::Pencil);
        down(&mut engine, (5.0, 5.0));
        up(&mut engine, (5.0, 5.0));
        assert!(engine.scene().is_empty());
        assert!(remote.sent().is_empty());
        assert!(!engine.history_state().can_undo);
    }

    #[test]
    fn test_move_broadcasts_only_on_release() {
        let (mut engine, remote) = engine_with(vec![rect_shape("s1", 0.0, 0.0, 50.0, 50.0)]);
        engine.set_tool(ToolKind::Select);
        down(&mut engine, (25.0, 25.0));
        assert_eq!(engine.selected_shape().map(Shape::id), Some("s1"));
        drag_to(&mut engine, (30.0, 30.0));
        drag_to(&mut engine, (35.0, 45.0));
        assert!(remote.sent().is_empty());
        up(&mut engine, (35.0, 45.0));

        let events = sent_events(&remote);
        assert_eq!(events.len(), 1);
        let ShapeEvent::Upsert(Shape::Rectangle(rect)) = &events[0] else {
            panic!("expected rectangle upsert");
        };
        assert_eq!((rect.x, rect.y), (10.0, 20.0));
        assert!(engine.history_state().can_undo);
    }

    #[test]
    fn test_click_without_drag_is_not_an_edit() {
        let (mut engine, remote) = engine_with(vec![rect_shape("s1", 0.0, 0.0, 50.0, 50.0)]);
        engine.set_tool(ToolKind::Select);
        down(&mut engine, (25.0, 25.0));
        up(&mut engine, (25.0, 25.0));
        assert!(remote.sent().is_empty());
        assert!(!engine.history_state().can_undo);
        assert!(engine.selected_shape().is_some());
    }

    #[test]
    fn test_resize_bottom_right_handle() {
        let (mut engine, remote) = engine_with(vec![rect_shape("s1", 100.0, 100.0, 50.0, 40.0)]);
        engine.set_tool(ToolKind::Select);
        down(&mut engine, (120.0, 120.0));
        up(&mut engine, (120.0, 120.0));

        down(&mut engine, (150.0, 140.0));
        drag_to(&mut engine, (170.0, 150.0));
        up(&mut engine, (170.0, 150.0));

        let Some(Shape::Rectangle(rect)) = engine.scene().get("s1") else {
            panic!("missing s1");
        };
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (100.0, 100.0, 70.0, 50.0));
        assert_eq!(sent_events(&remote).len(), 1);
    }

    #[test]
    fn test_resize_top_left_handle() {
        let (mut engine, _remote) = engine_with(vec![rect_shape("s1", 100.0, 100.0, 50.0, 40.0)]);
        engine.set_tool(ToolKind::Select);
        down(&mut engine, (120.0, 120.0));
        up(&mut engine, (120.0, 120.0));

        down(&mut engine, (100.0, 100.0));
        drag_to(&mut engine, (120.0, 110.0));
        up(&mut engine, (120.0, 110.0));

        let Some(Shape::Rectangle(rect)) = engine.scene().get("s1") else {
            panic!("missing s1");
        };
        assert_eq!((rect.x, rect.y, rect.width, rect.height), (120.0, 110.0, 30.0, 30.0));
    }

    #[test]
    fn test_eraser_removes_and_broadcasts() {
        let (mut engine, remote) = engine_with(vec![
            rect_shape("s1", 0.0, 0.0, 50.0, 50.0),
            rect_shape("s2", 200.0, 200.0, 50.0, 50.0),
        ]);
        let history = record_history(&mut engine);
        engine.set_tool(ToolKind::Eraser);
        down(&mut engine, (0.0, 25.0));
        drag_to(&mut engine, (0.0, 30.0));
        up(&mut engine, (0.0, 30.0));

        assert!(!engine.scene().contains("s1"));
        assert!(engine.scene().contains("s2"));
        assert_eq!(sent_events(&remote), vec![ShapeEvent::Erase("s1".into())]);
        assert_eq!(history.borrow().len(), 1);
    }

    #[test]
    fn test_eraser_tolerance_scales_with_zoom() {
        let (mut engine, _remote) = engine_with(vec![rect_shape("s1", 0.0, 0.0, 50.0, 50.0)]);
        engine.handle_pointer(PointerEvent::Wheel {
            position: Point::new(400.0, 300.0),
            delta: Vec2::new(0.0, -100.0),
            modifiers: Modifiers::CTRL,
        });
        assert!((engine.camera().zoom() - 2.0).abs() < 1e-9);
        engine.set_tool(ToolKind::Eraser);
        // Radius is 10px, or 5 world units at zoom 2.
        down(&mut engine, (-6.0, 25.0));
        up(&mut engine, (-6.0, 25.0));
        assert!(engine.scene().contains("s1"));
        down(&mut engine, (-4.0, 25.0));
        up(&mut engine, (-4.0, 25.0));
        assert!(!engine.scene().contains("s1"));
    }

    #[test]
    fn test_undo_redo_restore_and_notify() {
        let (mut engine, _remote) = engine_with(Vec::new());
        let history = record_history(&mut engine);
        engine.set_tool(ToolKind::Rectangle);
        for i in 0..3 {
            let x = i as f64 * 100.0;
            down(&mut engine, (x, 0.0));
            up(&mut engine, (x + 20.0, 20.0));
        }
        assert_eq!(engine.scene().len(), 3);

        for _ in 0..3 {
            engine.undo();
        }
        assert!(engine.scene().is_empty());
        assert_eq!(
            engine.history_state(),
            HistoryState {
                can_undo: false,
                can_redo: true
            }
        );
        engine.undo();
        assert_eq!(history.borrow().len(), 6);

        engine.handle_key(KeyEvent::pressed("KeyY", "y", Modifiers::CTRL));
        engine.redo();
        engine.redo();
        assert_eq!(engine.scene().len(), 3);
        assert_eq!(
            history.borrow().last(),
            Some(&HistoryState {
                can_undo: true,
                can_redo: false
            })
        );
    }

    #[test]
    fn test_undo_clears_selection_of_removed_shape() {
        let (mut engine, _remote) = engine_with(Vec::new());
        engine.set_tool(ToolKind::Rectangle);
        down(&mut engine, (0.0, 0.0));
        up(&mut engine, (50.0, 50.0));
        engine.set_tool(ToolKind::Select);
        down(&mut engine, (25.0, 25.0));
        up(&mut engine, (25.0, 25.0));
        assert!(engine.selected_shape().is_some());
        engine.handle_key(KeyEvent::pressed("KeyZ", "z", Modifiers::CTRL));
        assert!(engine.scene().is_empty());
        assert!(engine.selected_shape().is_none());
    }

    #[test]
    fn test_inbound_edits_bypass_history() {
        let (mut engine, remote) = engine_with(Vec::new());
        let history = record_history(&mut engine);
        let shape = rect_shape("s1", 0.0, 0.0, 10.0, 10.0);
        remote.push_incoming(chat_frame(&ShapeEvent::Upsert(shape.clone())));
        engine.poll_channel();
        assert_eq!(engine.scene().get("s1"), Some(&shape));

        let moved = rect_shape("s1", 5.0, 5.0, 10.0, 10.0);
        engine.handle_frame(&chat_frame(&ShapeEvent::Upsert(moved.clone())));
        assert_eq!(engine.scene().all(), std::slice::from_ref(&moved));

        engine.handle_frame(&chat_frame(&ShapeEvent::Erase("s1".into())));
        engine.handle_frame(&chat_frame(&ShapeEvent::Erase("s1".into())));
        assert!(engine.scene().is_empty());
        assert!(history.borrow().is_empty());
        assert_eq!(engine.history_state(), HistoryState::default());
        assert!(remote.sent().is_empty());
    }

    #[test]
    fn test_malformed_inbound_frames_are_ignored() {
        let (mut engine, _remote) = engine_with(vec![rect_shape("s1", 0.0, 0.0, 10.0, 10.0)]);
        engine.handle_frame("not json");
        engine.handle_frame(r#"{"type":"chat","message":"not json"}"#);
        engine.handle_frame(r#"{"type":"chat","message":"{\"shape\":{\"type\":\"blob\"}}"}"#);
        assert_eq!(engine.scene().len(), 1);
    }

    #[test]
    fn test_text_click_opens_edit_and_commits() {
        let (mut engine, remote) = engine_with(Vec::new());
        let opened = Rc::new(RefCell::new(None));
        let sink = opened.clone();
        engine.set_text_edit_listener(move |edit| *sink.borrow_mut() = Some(edit.world));
        engine.set_tool(ToolKind::Text);

        down(&mut engine, (10.0, 20.0));
        up(&mut engine, (10.0, 20.0));
        assert_eq!(*opened.borrow(), Some(Point::new(10.0, 20.0)));
        assert!(engine.update_text("hello"));

        let id = engine.commit_text().unwrap();
        let Some(Shape::Text(text)) = engine.scene().get(&id) else {
            panic!("missing text");
        };
        assert_eq!((text.x, text.y), (10.0, 20.0));
        assert_eq!(text.text, "hello");
        assert_eq!(sent_events(&remote).len(), 1);
        assert!(engine.text_edit().is_none());
    }

    #[test]
    fn test_switching_tools_force_commits_text() {
        let (mut engine, _remote) = engine_with(Vec::new());
        engine.set_tool(ToolKind::Text);
        down(&mut engine, (0.0, 0.0));
        up(&mut engine, (0.0, 0.0));
        engine.update_text("draft");
        engine.set_tool(ToolKind::Select);
        assert_eq!(engine.scene().len(), 1);
        assert!(engine.history_state().can_undo);
    }

    #[test]
    fn test_blank_text_is_ignored() {
        let (mut engine, remote) = engine_with(Vec::new());
        assert!(engine.add_text("   \n ", Point::ZERO).is_none());
        engine.set_tool(ToolKind::Text);
        down(&mut engine, (0.0, 0.0));
        up(&mut engine, (0.0, 0.0));
        assert!(engine.commit_text().is_none());
        assert!(engine.scene().is_empty());
        assert!(remote.sent().is_empty());
    }

    #[test]
    fn test_middle_button_pans_any_tool() {
        let (mut engine, remote) = engine_with(Vec::new());
        engine.set_tool(ToolKind::Rectangle);
        engine.handle_pointer(PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Middle,
        });
        engine.handle_pointer(PointerEvent::Move {
            position: Point::new(130.0, 90.0),
        });
        engine.handle_pointer(PointerEvent::Up {
            position: Point::new(130.0, 90.0),
            button: MouseButton::Middle,
        });
        assert_eq!(engine.camera().offset, Vec2::new(430.0, 290.0));
        assert!(engine.scene().is_empty());
        assert!(remote.sent().is_empty());
    }

    #[test]
    fn test_space_hold_pans_until_released() {
        let (mut engine, _remote) = engine_with(Vec::new());
        engine.set_tool(ToolKind::Pencil);
        engine.handle_key(KeyEvent::pressed("Space", " ", Modifiers::default()));
        assert_eq!(engine.cursor(), CursorIcon::Grab);
        engine.handle_pointer(PointerEvent::Down {
            position: Point::ZERO,
            button: MouseButton::Left,
        });
        engine.handle_pointer(PointerEvent::Move {
            position: Point::new(10.0, 10.0),
        });
        assert_eq!(engine.camera().offset, Vec2::new(410.0, 310.0));
        engine.handle_key(KeyEvent::released("Space", " ", Modifiers::default()));
        engine.handle_pointer(PointerEvent::Move {
            position: Point::new(50.0, 50.0),
        });
        assert_eq!(engine.camera().offset, Vec2::new(410.0, 310.0));
        assert_eq!(engine.cursor(), CursorIcon::Crosshair);
    }

    #[test]
    fn test_coordinate_conversion() {
        let (engine, _remote) = engine_with(Vec::new());
        let world = Point::new(12.0, -7.0);
        assert_eq!(engine.screen_to_world(engine.world_to_screen(world)), world);
        assert_eq!(engine.screen_to_world(Point::new(400.0, 300.0)), Point::ZERO);
    }

    #[test]
    fn test_teardown_ignores_later_events() {
        let (mut engine, remote) = engine_with(Vec::new());
        let frames = engine.surface().frame_count();
        engine.teardown();
        engine.set_tool(ToolKind::Rectangle);
        down(&mut engine, (0.0, 0.0));
        up(&mut engine, (20.0, 20.0));
        remote.push_incoming(chat_frame(&ShapeEvent::Upsert(rect_shape("s1", 0.0, 0.0, 1.0, 1.0))));
        engine.poll_channel();
        assert!(engine.scene().is_empty());
        assert!(remote.sent().is_empty());
        assert_eq!(engine.surface().frame_count(), frames);
        assert!(!engine.is_attached());
    }

    #[test]
    fn test_select_cursor_follows_hover() {
        let (mut engine, _remote) = engine_with(vec![rect_shape("s1", 0.0, 0.0, 50.0, 50.0)]);
        engine.set_tool(ToolKind::Select);
        drag_to(&mut engine, (25.0, 25.0));
        assert_eq!(engine.cursor(), CursorIcon::Move);
        down(&mut engine, (25.0, 25.0));
        up(&mut engine, (25.0, 25.0));
        drag_to(&mut engine, (50.0, 50.0));
        assert_eq!(engine.cursor(), CursorIcon::NwseResize);
        drag_to(&mut engine, (300.0, 300.0));
        assert_eq!(engine.cursor(), CursorIcon::Default);
    }

    #[tokio::test]
    async fn test_connect_seeds_from_source() {
        let source = StaticShapeSource {
            shapes: vec![
                rect_shape("a", 0.0, 0.0, 1.0, 1.0),
                rect_shape("b", 5.0, 5.0, 1.0, 1.0),
            ],
        };
        let engine = DrawingEngine::connect(
            EngineConfig::new("abc"),
            DisplayList::new(Size::new(100.0, 100.0)),
            LoopbackChannel::new(),
            &source,
        )
        .await;
        let ids: Vec<_> = engine.scene().all().iter().map(Shape::id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(!engine.history_state().can_undo);
    }
}
