//! Fixed timestep simulation tick
//!
//! Core game loop that advances the scene deterministically. Within a tick
//! the order is fixed: controllers, physics step, contact resolution, camera,
//! session checks, chaser bookkeeping.

use super::input::TickInput;
use super::player::PlayerContext;
use super::resolver::Actors;
use super::state::{GameEvent, Scene};
use crate::height_meters;

/// Advance the scene by one fixed timestep
pub fn tick(scene: &mut Scene, input: &TickInput, dt: f32) {
    // Time and height freeze once the session is decided
    if scene.is_over() {
        return;
    }

    scene.time_ticks += 1;
    scene.elapsed += f64::from(dt);
    let scale = scene.scale.scale;

    // Player
    let ctx = PlayerContext {
        dt,
        scale,
        keyboard_available: scene.settings.keyboard_available,
        jump_multiplier: scene.settings.jump_height_multiplier(scale),
    };
    let player_velocity = scene.player_velocity();
    if let Some(launch) = scene
        .player
        .update(input, player_velocity, &ctx, &mut scene.events)
    {
        scene.world.set_velocity(scene.player.body, launch);
    }
    let player_position = scene.player_position();

    // Fliers
    for flier in &mut scene.fliers {
        let Some(x) = scene.world.position(flier.body).map(|p| p.x) else {
            continue;
        };
        let velocity = flier.update(x, scale);
        scene.world.set_velocity(flier.body, velocity);
    }

    // Chasers
    for (index, chaser) in scene.chasers.iter_mut().enumerate() {
        let Some(body) = chaser.body else {
            continue;
        };
        let (Some(position), Some(velocity)) =
            (scene.world.position(body), scene.world.velocity(body))
        else {
            continue;
        };
        let (command, alerted) = chaser.update(position, velocity, player_position, scale);
        if alerted {
            scene.events.push(GameEvent::ChaserAlerted(index));
        }
        if let Some(velocity) = command {
            scene.world.set_velocity(body, velocity);
        }
    }

    // Physics
    let contacts = scene.world.step(dt);
    let resolution = {
        let mut actors = Actors {
            world: &mut scene.world,
            labels: &scene.labels,
            player: &mut scene.player,
            fliers: &scene.fliers,
            chasers: &mut scene.chasers,
            events: &mut scene.events,
        };
        scene.resolver.resolve(&contacts, &mut actors)
    };

    // Camera and height
    let player_y = scene.player_position().y;
    scene.camera.follow(player_y, dt);
    scene.max_height = scene.max_height.max(height_meters(player_y));

    // Reaching the door wins over a catch in the same tick
    if scene.player.on_goal {
        scene.finish(true);
    } else if resolution.caught {
        scene.finish(false);
    }

    // Chaser lifecycle
    let view_bottom = scene.camera.bottom();
    let scroll_y = scene.camera.scroll_y;
    for index in 0..scene.chasers.len() {
        let chaser = &scene.chasers[index];
        if chaser.is_alive() {
            let y = chaser
                .body
                .and_then(|b| scene.world.position(b))
                .map_or(f32::NEG_INFINITY, |p| p.y);
            if chaser.should_die(y, view_bottom) {
                scene.kill_chaser(index);
            }
        } else if chaser.should_respawn(scroll_y) {
            scene.respawn_chaser(index);
        }
    }
}
