use bevy::asset::LoadState;
use bevy::prelude::*;

use crate::config::GameConfig;
use crate::scene::ScenePhase;

#[derive(Resource, Debug, Clone)]
pub struct SceneAssets {
    pub background: Handle<Image>,
}

pub struct LoadingPlugin;
impl Plugin for LoadingPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(ScenePhase::Preload), load_assets)
            .add_systems(Update, wait_for_assets.run_if(in_state(ScenePhase::Preload)));
    }
}

fn load_assets(mut commands: Commands, asset_server: Res<AssetServer>, config: Res<GameConfig>) {
    commands.insert_resource(SceneAssets {
        background: asset_server.load(config.background_path),
    });
}

fn wait_for_assets(
    asset_server: Res<AssetServer>,
    images: Res<Assets<Image>>,
    assets: Option<Res<SceneAssets>>,
    mut next_phase: ResMut<NextState<ScenePhase>>,
) {
    let Some(assets) = assets else {
        return;
    };
    if images.contains(&assets.background) {
        debug!("background loaded");
        next_phase.set(ScenePhase::Running);
        return;
    }
    if let LoadState::Failed(err) = asset_server.load_state(&assets.background) {
        warn!("background failed to load, running without it: {err}");
        next_phase.set(ScenePhase::Running);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::AssetPlugin;
    use bevy::state::app::StatesPlugin;
    use std::time::Duration;

    fn loading_app(background_path: &'static str) -> App {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default(), StatesPlugin))
            .init_asset::<Image>()
            .init_state::<ScenePhase>()
            .insert_resource(GameConfig {
                background_path,
                ..default()
            })
            .add_plugins(LoadingPlugin);
        app
    }

    fn phase(app: &App) -> ScenePhase {
        *app.world().resource::<State<ScenePhase>>().get()
    }

    /// Loads finish on the IO task pool, so give them a few real frames.
    fn run_until_running(app: &mut App) -> bool {
        for _ in 0..200 {
            app.update();
            if phase(app) == ScenePhase::Running {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn missing_background_still_starts_the_scene() {
        let mut app = loading_app("no_such_background.png");
        assert!(run_until_running(&mut app));
    }

    #[test]
    fn loaded_background_starts_the_scene() {
        let mut app = loading_app("no_such_background.png");
        app.update();
        assert_eq!(phase(&app), ScenePhase::Preload);

        let background = app
            .world_mut()
            .resource_mut::<Assets<Image>>()
            .add(Image::default());
        app.insert_resource(SceneAssets { background });

        app.update();
        app.update();
        assert_eq!(phase(&app), ScenePhase::Running);
    }
}
