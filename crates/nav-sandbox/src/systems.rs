//! Simulation Systems
//!
//! Per-tick systems run in a fixed order: target detection, navigator
//! update plus steering, then status reporting.

use bevy_ecs::prelude::*;
use nav_core::{NavGraph, NavMode, Path, PathMode, TargetRef, TickEvent};
use tracing::{debug, info, warn};

use crate::agent::{AgentPose, Locomotion, NavControl};
use crate::config::Config;
use crate::terrain::Terrain;
use crate::world::Target;

/// Resource: global simulation state
#[derive(Resource)]
pub struct SimState {
    pub current_tick: u64,
    pub max_ticks: u64,
    pub report_interval: u64,
}

/// Resource: the world's navigation graph
#[derive(Resource)]
pub struct NavGraphRes(pub NavGraph);

/// Resource: the terrain height field
#[derive(Resource)]
pub struct TerrainRes(pub Terrain);

/// Resource: all huntable targets
#[derive(Resource)]
pub struct Targets(pub Vec<Target>);

/// Resource: loaded tuning parameters
#[derive(Resource)]
pub struct Tuning(pub Config);

/// Put patrolling agents onto a seek route when an unfound target comes
/// within detection range. A failed route computation is logged and the
/// agent silently continues its patrol.
pub fn detect_targets(
    mut graph: ResMut<NavGraphRes>,
    targets: Res<Targets>,
    tuning: Res<Tuning>,
    mut query: Query<(&AgentPose, &mut NavControl)>,
) {
    for (pose, mut control) in query.iter_mut() {
        if control.navigator.mode() != NavMode::OnFixedPath {
            continue;
        }

        // Closest unfound target within detection range, if any.
        let detected = targets
            .0
            .iter()
            .enumerate()
            .filter(|(_, target)| !target.found)
            .map(|(index, target)| (index, pose.position.distance(target.position)))
            .filter(|(_, distance)| *distance <= tuning.0.targets.detection_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        let Some((index, distance)) = detected else {
            continue;
        };

        let target = &targets.0[index];
        let route = graph
            .0
            .find_nearest(pose.position)
            .ok_or(nav_core::NavError::NoPath)
            .and_then(|start| {
                let dest = graph.0.require(target.grid)?;
                graph.0.find_path(start, dest)
            });
        let nodes = match route {
            Ok(nodes) => nodes,
            Err(err) => {
                warn!(%err, target = index, "cannot route to target, staying on patrol");
                continue;
            }
        };

        let seek = Path::from_nodes(nodes, PathMode::Single);
        match control
            .navigator
            .begin_seek(TargetRef::new(index, target.position), seek)
        {
            Ok(()) => debug!(target = index, distance, "target detected, seeking"),
            Err(err) => warn!(%err, target = index, "seek request refused"),
        }
    }
}

/// Advance every navigator one tick and apply its steering to the pose.
/// Tag events mark the world target found and queue the detour back to
/// the patrol route.
pub fn drive_agents(
    mut graph: ResMut<NavGraphRes>,
    terrain: Res<TerrainRes>,
    mut targets: ResMut<Targets>,
    mut query: Query<(&mut AgentPose, &Locomotion, &mut NavControl)>,
) {
    for (mut pose, locomotion, mut control) in query.iter_mut() {
        let position = pose.position;
        let out = control.navigator.update(&mut graph.0, position);

        match out.event {
            TickEvent::TargetTagged { index } => {
                if let Some(target) = targets.0.get_mut(index) {
                    target.found = true;
                }
                info!(
                    target = index,
                    tagged = control.navigator.tagged_count(),
                    "target tagged"
                );
                if let Err(err) = control.navigator.request_detour() {
                    warn!(%err, "could not start detour after tag");
                }
            }
            TickEvent::SeekAbandoned => {
                debug!("seek abandoned, returning to patrol");
                if let Err(err) = control.navigator.request_detour() {
                    warn!(%err, "could not start detour after abandoned seek");
                }
            }
            TickEvent::DetourComplete => debug!("detour complete"),
            TickEvent::None => {}
        }

        if let Some(steering) = out.steering {
            pose.turn_toward(steering.face_toward, locomotion.turn_rate);
            if steering.advance {
                pose.step_forward(locomotion.displacement());
            }
            // Keep the entity on the terrain surface.
            pose.position.y = terrain.0.height_at(pose.position.x, pose.position.z);
        }
    }
}

/// Emit the navigator's diagnostic line at the configured interval.
pub fn report_status(
    state: Res<SimState>,
    graph: Res<NavGraphRes>,
    query: Query<(&AgentPose, &NavControl)>,
) {
    if state.report_interval == 0 || state.current_tick % state.report_interval != 0 {
        return;
    }
    for (pose, control) in query.iter() {
        info!(
            tick = state.current_tick,
            "{}",
            control.navigator.status_line(&graph.0, pose.position)
        );
    }
}
