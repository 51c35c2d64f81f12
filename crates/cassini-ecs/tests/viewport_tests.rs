//! Integration tests for viewport allocation through the world.

use cassini_ecs::prelude::*;

fn join(world: &mut World) -> EntityId {
    let e = world.create_entity();
    world.insert(e, Camera::new(800.0, 480.0)).unwrap();
    world.insert(e, Viewport::default()).unwrap();
    world.add_to_world(e).unwrap();
    e
}

fn shape(world: &World) -> (u32, u32) {
    let grid = world.viewport_grid();
    (grid.columns, grid.rows)
}

#[test]
fn four_agents_join_and_leave() {
    let mut world = World::new();
    let mut agents = Vec::new();
    let mut shapes = Vec::new();
    for _ in 0..4 {
        agents.push(join(&mut world));
        shapes.push(shape(&world));
    }
    assert_eq!(shapes, vec![(1, 1), (2, 1), (2, 2), (2, 2)]);
    assert_eq!(world.viewport_slot(agents[3]), Some(4));

    world.delete_entity(agents[0]).unwrap();
    assert_eq!(shape(&world), (2, 2));

    world.delete_entity(agents[1]).unwrap();
    assert_eq!(shape(&world), (2, 1));
    assert_eq!(world.viewport_slot(agents[2]), Some(1));
    assert_eq!(world.viewport_slot(agents[3]), Some(2));
    assert_eq!(
        world.get::<Viewport>(agents[3]),
        Some(&Viewport { x: 400, y: 0, width: 400, height: 480 })
    );

    world.delete_entity(agents[2]).unwrap();
    world.delete_entity(agents[3]).unwrap();
    assert_eq!(shape(&world), (1, 1));
}

#[test]
fn two_by_two_rectangles_cover_the_screen() {
    let mut world = World::new();
    let agents: Vec<_> = (0..4).map(|_| join(&mut world)).collect();
    let rects: Vec<Viewport> = agents
        .iter()
        .map(|&e| *world.get::<Viewport>(e).unwrap())
        .collect();
    assert_eq!(
        rects,
        vec![
            Viewport { x: 0, y: 240, width: 400, height: 240 },
            Viewport { x: 400, y: 240, width: 400, height: 240 },
            Viewport { x: 0, y: 0, width: 400, height: 240 },
            Viewport { x: 400, y: 0, width: 400, height: 240 },
        ]
    );
    let area: i32 = rects.iter().map(|r| r.width * r.height).sum();
    assert_eq!(area, 800 * 480);
}

#[test]
fn cameras_keep_focus_across_reshapes() {
    let mut world = World::new();
    let first = join(&mut world);
    if let Some(camera) = world.get_mut::<Camera>(first) {
        camera.set_world_position(320.0, 96.0);
    }
    let _second = join(&mut world);
    let camera = world.get::<Camera>(first).unwrap();
    assert_eq!(camera.world.viewport_width, 400.0);
    assert_eq!((camera.world.position.x, camera.world.position.y), (320.0, 96.0));
}

#[test]
fn removing_the_last_agent_leaves_one_by_one() {
    let mut world = World::new();
    let a = join(&mut world);
    let b = join(&mut world);
    world.delete_entity(b).unwrap();
    world.delete_entity(a).unwrap();
    assert_eq!(shape(&world), (1, 1));
    assert_eq!(world.viewport_allocator().agent_count(), 0);
    let c = join(&mut world);
    assert_eq!(world.viewport_slot(c), Some(1));
}
