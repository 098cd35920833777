//! Museum tour demo
//!
//! Walks every exhibit in `assets/catalog.ron` headlessly: composes it from
//! the prototype pool, spins it with a simulated drag, teleports to each
//! waypoint and resets. Rendering is left to the host; this binary only logs
//! what a frame loop would see. `RUST_LOG` overrides the default `info`
//! verbosity. Extra model directories can be listed in `MUSEUM_ASSET_PATH`.

mod catalog;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use exhibit_engine::foundation::logging;
use exhibit_engine::interaction::resolve_active_waypoint;
use exhibit_engine::prelude::*;

use catalog::{Catalog, ExhibitEntry};

/// Tour failures
#[derive(thiserror::Error, Debug)]
pub enum TourError {
    #[error("Settings error: {0}")]
    Settings(#[from] ConfigError),

    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Frame interval of the simulated host loop
const FRAME: Duration = Duration::from_millis(16);

struct TourApp {
    settings: MotionSettings,
    catalog: Catalog,
    composer: EntityComposer<RonModelLoader>,
    pressure: MemoryPressureObserver,
}

impl TourApp {
    fn new(asset_dir: &Path) -> Result<Self, TourError> {
        let settings = MotionSettings::load_or_default(asset_dir.join("motion.toml"))?;
        let catalog = Catalog::load(&asset_dir.join("catalog.ron"))?;
        log::info!("Catalog lists {} exhibits", catalog.exhibits.len());

        let mut loader = RonModelLoader::new([asset_dir]);
        if let Some(extra) = std::env::var_os("MUSEUM_ASSET_PATH") {
            for dir in std::env::split_paths(&extra) {
                loader.add_search_path(dir);
            }
        }
        log::info!("Model search paths: {:?}", loader.search_paths());

        let pool = Arc::new(PrototypePool::new(loader, settings.pool.max_prototype_count));
        let composer = EntityComposer::with_settings(Arc::clone(&pool), settings.markers, &settings.animation);

        let mut pressure = MemoryPressureObserver::new();
        if !pressure.start(pool) {
            log::warn!("Memory pressure observer did not start");
        }

        Ok(Self {
            settings,
            catalog,
            composer,
            pressure,
        })
    }

    fn run(&mut self) -> Result<(), TourError> {
        let pool = Arc::clone(self.composer.pool());
        let ids = self.catalog.asset_ids();
        let preloading = thread::Builder::new()
            .name("preload".to_string())
            .spawn(move || pool.preload(ids))?;

        for exhibit in self.catalog.exhibits.clone() {
            self.visit(&exhibit)?;
        }

        match preloading.join() {
            Ok(count) => log::info!("Background preload finished with {} prototypes", count),
            Err(_) => log::error!("Preload thread panicked"),
        }
        self.log_resident_models();

        log::info!("Simulating memory pressure");
        self.pressure.signal().notify();
        thread::sleep(FRAME);
        log::info!(
            "Pool holds {} prototypes after {} pressure events",
            self.composer.pool().len(),
            self.pressure.handled_count()
        );
        self.pressure.stop();
        Ok(())
    }

    fn visit(&self, exhibit: &ExhibitEntry) -> Result<(), TourError> {
        log::info!("Visiting '{}'", exhibit.name);

        let explore = Configuration::explore_default();
        let immersive = Configuration::immersive_from(&Configuration::immersive_default(), &explore);
        let composite = self.composer.compose(
            exhibit.asset.as_ref(),
            &exhibit.hotspots,
            &exhibit.waypoints,
            &immersive,
        )?;
        if composite.is_placeholder() {
            log::warn!("'{}' is shown as a placeholder", exhibit.name);
        }
        let scene = composite.scene();
        let visible_hotspots = exhibit
            .hotspots
            .iter()
            .filter_map(|hotspot| composite.hotspot_node(&hotspot.id))
            .filter(|node| scene.is_visible_in_hierarchy(*node))
            .count();
        log::info!(
            "Composed {} scene nodes, {} of {} hotspots visible",
            scene.descendants(composite.root()).len(),
            visible_hotspots,
            exhibit.hotspots.len()
        );

        let mut session = InteractionSession::new(composite, immersive, &self.settings, Arc::new(FrameTicker));
        self.spin(&mut session)?;

        let mut selected = None;
        for waypoint in &exhibit.waypoints {
            if session.teleport_to_waypoint(&waypoint.id, &explore) {
                session.wait_idle();
                log_waypoint(&session, &waypoint.id);
                selected = Some(waypoint.id.as_str());
            }
        }
        if let Some(active) = resolve_active_waypoint(&exhibit.waypoints, None, selected) {
            log::info!("Tour would resume at waypoint '{}'", active.id);
        }

        if session.reset() {
            session.wait_idle();
            log_pose(&session, "reset");
        }
        Ok(())
    }

    /// Log the placed size of every model still resident in the pool
    fn log_resident_models(&self) {
        let pool = self.composer.pool();
        for id in pool.resident_ids() {
            let Some(model) = pool.get(&id) else {
                continue;
            };
            match model.visual_bounds(&Transform::identity()) {
                Some(bounds) => {
                    let size = bounds.size();
                    log::info!("Model '{}' spans {:.1} x {:.1} x {:.1}", id, size.x, size.y, size.z);
                }
                None => log::info!("Model '{}' has no geometry", id),
            }
        }
    }

    /// Drag a quarter turn over ten frames, release with momentum and keep
    /// syncing until coasting settles
    fn spin(&self, session: &mut InteractionSession) -> Result<(), TourError> {
        let start = Vec3::zeros();
        let mut location = start;
        for _ in 0..10 {
            location.x += 0.04;
            session.drag_changed(&DragSample::new(start, location));
            session.sync()?;
            thread::sleep(FRAME);
        }
        session.drag_ended(&DragSample::new(start, location).with_predicted_end(location + Vec3::new(0.08, 0.0, 0.0)));

        while session.is_coasting() {
            session.sync()?;
            thread::sleep(FRAME);
        }
        session.sync()?;

        let yaw = session.configuration().lock().map(|c| c.yaw_degrees).unwrap_or_default();
        log::info!("Spin settled at yaw {:.1} degrees", yaw);
        Ok(())
    }
}

/// World position of a waypoint marker after teleporting to it
fn log_waypoint(session: &InteractionSession, id: &str) {
    if let Ok(composite) = session.composite().lock() {
        let world = composite
            .waypoint_node(id)
            .and_then(|node| composite.scene().world_transform(node));
        if let Some(world) = world {
            log::info!(
                "[{}] waypoint at ({:.2}, {:.2}, {:.2})",
                id,
                world.position.x,
                world.position.y,
                world.position.z
            );
        }
    }
}

fn log_pose(session: &InteractionSession, label: &str) {
    if let Ok(composite) = session.composite().lock() {
        let pose = composite.pose();
        log::info!(
            "[{}] root at ({:.2}, {:.2}, {:.2})",
            label,
            pose.position.x,
            pose.position.y,
            pose.position.z
        );
    }
}

fn asset_dir() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("assets"), PathBuf::from)
}

fn main() -> Result<(), TourError> {
    logging::init();
    log::info!("Starting museum tour");

    let mut app = TourApp::new(&asset_dir())?;
    match app.run() {
        Ok(()) => {
            log::info!("Tour completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Tour failed: {}", e);
            Err(e)
        }
    }
}
