#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use futures::executor::LocalPool;
use futures::task::LocalSpawnExt;
use serde::Deserialize;
use vizij_behavior_core::{Frame, FrameClock, Host, ImageRef, VisualElement};

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Executor plus manual clock; every tick advances the clock then runs all
/// ready tasks.
pub struct Harness {
    pub pool: LocalPool,
    pub clock: Rc<FrameClock>,
    pub host: Host,
}

impl Harness {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let clock = Rc::new(FrameClock::new());
        let host = Host::new(Rc::new(pool.spawner()), clock.clone(), clock.clone());
        Self { pool, clock, host }
    }

    pub fn run(&mut self) {
        self.pool.run_until_stalled();
    }

    pub fn tick(&mut self, dt: u64) {
        self.clock.advance(ms(dt));
        self.pool.run_until_stalled();
    }

    pub fn ticks(&mut self, count: usize, dt: u64) {
        for _ in 0..count {
            self.tick(dt);
        }
    }

    /// Drive `fut` on the pool; the slot fills once it resolves.
    pub fn spawn<T: 'static>(&self, fut: impl Future<Output = T> + 'static) -> Slot<T> {
        let slot = Slot(Rc::new(RefCell::new(None)));
        let out = slot.clone();
        self.pool
            .spawner()
            .spawn_local(async move {
                *out.0.borrow_mut() = Some(fut.await);
            })
            .expect("spawn test future");
        slot
    }
}

pub struct Slot<T>(Rc<RefCell<Option<T>>>);

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Slot(self.0.clone())
    }
}

impl<T: Clone> Slot<T> {
    pub fn get(&self) -> Option<T> {
        self.0.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        self.0.borrow().is_none()
    }
}

/// Scene node as written in behavior fixtures.
#[derive(Debug, Deserialize)]
pub struct SceneNode {
    pub id: String,
    #[serde(default)]
    pub frame: Option<Frame>,
    #[serde(default)]
    pub children: Vec<SceneNode>,
}

#[derive(Debug, Deserialize)]
pub struct BehaviorFixture {
    pub registry: String,
    pub scene: SceneNode,
    pub descriptors: serde_json::Value,
}

/// Element that records what it was asked to display.
pub struct TestElement {
    id: String,
    frame: Option<Frame>,
    children: Vec<Rc<TestElement>>,
    loaded: RefCell<Vec<ImageRef>>,
    visible: Cell<bool>,
    accepts_images: bool,
}

impl TestElement {
    pub fn new(id: &str) -> Rc<Self> {
        Rc::new(Self::bare(id, None, Vec::new(), true))
    }

    /// Element that cannot display images (a plain container).
    pub fn container(id: &str) -> Rc<Self> {
        Rc::new(Self::bare(id, None, Vec::new(), false))
    }

    pub fn from_scene(node: &SceneNode) -> Rc<Self> {
        let children = node.children.iter().map(TestElement::from_scene).collect();
        Rc::new(Self::bare(&node.id, node.frame.clone(), children, true))
    }

    fn bare(id: &str, frame: Option<Frame>, children: Vec<Rc<TestElement>>, accepts: bool) -> Self {
        Self {
            id: id.to_string(),
            frame,
            children,
            loaded: RefCell::new(Vec::new()),
            visible: Cell::new(false),
            accepts_images: accepts,
        }
    }

    pub fn named(&self, name: &str) -> Option<Rc<TestElement>> {
        self.children.iter().find_map(|child| {
            if child.id == name {
                Some(child.clone())
            } else {
                child.named(name)
            }
        })
    }

    pub fn loaded(&self) -> Vec<ImageRef> {
        self.loaded.borrow().clone()
    }

    pub fn last_loaded(&self) -> Option<ImageRef> {
        self.loaded.borrow().last().cloned()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }
}

impl VisualElement for TestElement {
    fn id(&self) -> &str {
        &self.id
    }

    fn hide(&self) {
        self.visible.set(false);
    }

    fn show(&self) {
        self.visible.set(true);
    }

    fn accepts_images(&self) -> bool {
        self.accepts_images
    }

    fn on_remote_loaded(&self, image: &ImageRef) {
        self.loaded.borrow_mut().push(image.clone());
    }

    fn find(&self, name: &str) -> Option<Rc<dyn VisualElement>> {
        self.named(name).map(|el| el as Rc<dyn VisualElement>)
    }

    fn children(&self) -> Vec<Rc<dyn VisualElement>> {
        self.children
            .iter()
            .map(|child| child.clone() as Rc<dyn VisualElement>)
            .collect()
    }

    fn frame(&self) -> Option<Frame> {
        self.frame.clone()
    }
}
