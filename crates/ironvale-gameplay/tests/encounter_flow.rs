//! Overworld to arena and back, driven through `World`.

use ironvale_common::Vec2;
use ironvale_gameplay::prelude::*;

const DT: f32 = 0.1;

fn world_with_player(at: Vec2) -> World {
    let mut player = Player::new("Hero", at);
    player.combatant = player.combatant.with_max_health(1000);
    World::new(GameMap::overworld(4000.0, 3000.0), player)
        .with_combat_engine(CombatEngine::new(CombatConfig::default(), ScriptedRolls::always_hit()))
}

#[test]
fn bandit_contact_enters_arena_in_one_tick() {
    let mut world = world_with_player(Vec2::new(1000.0, 1000.0));
    let bandit = world.spawn_npc(
        Npc::new("Bandit", Vec2::new(1010.0, 1000.0)).with_faction(Faction::Bandit),
    );

    let events = world.tick(DT);

    assert_eq!(events, vec![EncounterEvent::CombatStarted { npc: bandit }]);
    assert_eq!(world.map().kind, MapKind::Arena);
    assert!(world.encounter().in_combat());
    assert_eq!(world.player().position(), Vec2::new(100.0, 1400.0));

    let controller = world.npc(bandit).expect("bandit");
    assert_eq!(controller.state(), AiState::Combat);
    assert_eq!(controller.target_entity(), Some(world.player().id()));
    assert_eq!(controller.npc().combatant.position, Vec2::new(1400.0, 100.0));

    // Pushed 30 units away from the bandit before the transition.
    assert_eq!(world.encounter().return_position(), Some(Vec2::new(970.0, 1000.0)));
}

#[test]
fn disengage_restores_the_overworld() {
    let mut world = world_with_player(Vec2::new(1000.0, 1000.0));
    let bandit = world.spawn_npc(
        Npc::new("Bandit", Vec2::new(1010.0, 1000.0)).with_faction(Faction::Bandit),
    );
    world.tick(DT);

    let event = world.disengage();
    assert_eq!(
        event,
        Some(EncounterEvent::CombatEnded {
            npc: bandit,
            outcome: CombatOutcome::Disengaged,
        })
    );
    assert_eq!(world.map().kind, MapKind::Overworld);
    assert_eq!(world.player().position(), Vec2::new(970.0, 1000.0));

    let controller = world.npc(bandit).expect("bandit survives");
    assert_eq!(controller.npc().combatant.position, Vec2::new(1010.0, 1000.0));
    assert_eq!(controller.target_entity(), None);
    assert_ne!(controller.state(), AiState::Combat);

    // Contacts stay quiet during the cooldown.
    assert!(world.tick(DT).is_empty());
    assert!(world.encounter().cooldown_remaining(world.sim_time()) > 0.0);
}

#[test]
fn arena_fight_ends_with_npc_defeated() {
    let mut world = world_with_player(Vec2::new(1000.0, 1000.0));
    let bandit = world.spawn_npc(
        Npc::new("Bandit", Vec2::new(1010.0, 1000.0)).with_faction(Faction::Bandit),
    );
    world.tick(DT);
    let return_to = world.encounter().return_position().expect("in arena");

    let mut ended = None;
    for _ in 0..3000 {
        if let Some(controller) = world.npc(bandit) {
            let offset = controller.npc().combatant.position - world.player().position();
            if offset.length() > 40.0 {
                world.move_player(offset.normalize() * 7.0);
            } else {
                world.player_attack(bandit);
            }
        }

        let events = world.tick(DT);
        if let Some(EncounterEvent::CombatEnded { outcome, .. }) = events.into_iter().next() {
            ended = Some(outcome);
            break;
        }
    }

    assert_eq!(ended, Some(CombatOutcome::NpcDefeated));
    assert!(world.npc(bandit).is_none(), "fallen NPC is removed");
    assert_eq!(world.map().kind, MapKind::Overworld);
    assert_eq!(world.player().position(), return_to);
    assert!(world.player().combatant.is_alive());
}

#[test]
fn talk_choice_pushes_player_away() {
    let mut world = world_with_player(Vec2::new(1000.0, 1000.0));
    let farmer = world.spawn_npc(Npc::new("Farmer", Vec2::new(1000.0, 1010.0)));

    let events = world.tick(DT);
    assert!(matches!(
        events.as_slice(),
        [EncounterEvent::ChoiceOffered { npc, .. }] if *npc == farmer
    ));
    assert_eq!(world.encounter().pending_choice(), Some(farmer));
    assert_eq!(world.player().position(), Vec2::new(1000.0, 970.0));

    assert!(world.resolve_choice(EncounterChoice::Talk).is_empty());
    assert_eq!(world.player().position(), Vec2::new(1000.0, 930.0));
    assert_eq!(world.map().kind, MapKind::Overworld);
    assert_eq!(world.encounter().pending_choice(), None);
}

#[test]
fn attack_choice_turns_npc_hostile() {
    let mut world = world_with_player(Vec2::new(1000.0, 1000.0));
    let farmer = world.spawn_npc(Npc::new("Farmer", Vec2::new(1000.0, 1010.0)));
    world.tick(DT);

    let events = world.resolve_choice(EncounterChoice::Attack);
    assert_eq!(events, vec![EncounterEvent::CombatStarted { npc: farmer }]);

    let npc = world.npc(farmer).expect("farmer").npc();
    assert_eq!(npc.faction, Faction::Enemy);
    assert_eq!(npc.relationship(), Relationship::Hostile);
    assert_eq!(world.map().kind, MapKind::Arena);
}
