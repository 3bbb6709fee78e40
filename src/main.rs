use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use std::time::Duration;

use debris_field::mapgen::{MapGenDemoSettings, MapGenPlugin, MapGenStatus};

fn main() {
    // Optional args: <config asset path> <player count>
    let mut args = std::env::args().skip(1);
    let mut demo = MapGenDemoSettings::default();
    if let Some(path) = args.next() {
        demo.config_path = path;
    }
    if let Some(players) = args.next().and_then(|p| p.parse().ok()) {
        demo.players = players;
    }

    App::new()
        // headless: no window, tick every 10ms until the field is done
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_millis(10))),
        )
        .add_plugins(LogPlugin::default())
        .add_plugins(AssetPlugin::default())
        .insert_resource(demo)
        .add_plugins(MapGenPlugin)
        .add_systems(Update, exit_when_finished)
        .run();
}

fn exit_when_finished(status: Res<MapGenStatus>, mut exit: EventWriter<AppExit>) {
    match *status {
        MapGenStatus::Loading => {}
        MapGenStatus::Done => {
            exit.write(AppExit::Success);
        }
        MapGenStatus::Failed => {
            exit.write(AppExit::error());
        }
    }
}
