#[cfg(test)]
mod tests {
    use crate::{
        Effect, EffectKind, EventKind, EventTag, Player, PokemonIdent, Stat, parse_block,
        parse_event,
    };

    #[test]
    fn test_parse_switch() {
        let event = parse_event("|switch|p2a: Gengar|Gengar, L80, M|100/100")
            .unwrap()
            .unwrap();

        assert_eq!(event.tag(), EventTag::Switch);
        match event.kind {
            EventKind::Switch {
                pokemon,
                details,
                hp_status,
            } => {
                assert_eq!(pokemon.player, Player::P2);
                assert_eq!(pokemon.position, Some('a'));
                assert_eq!(pokemon.name, "Gengar");
                assert_eq!(details.level, Some(80));
                assert_eq!(hp_status.unwrap().current, 100);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_flags() {
        let event = parse_event("|-heal|p2a: Snorlax|56/100|[from] item: Leftovers")
            .unwrap()
            .unwrap();

        assert_eq!(event.tag(), EventTag::Heal);
        assert_eq!(
            event.flags.from_effect(),
            Some(Effect {
                kind: EffectKind::Item,
                name: "Leftovers".to_string()
            })
        );

        let event = parse_event("|-ability|p1a: Gyarados|Intimidate|boost")
            .unwrap()
            .unwrap();
        assert!(event.flags.is_empty());

        let event = parse_event("|move|p1a: Gyarados|Waterfall|p2a: Snorlax|[miss]")
            .unwrap()
            .unwrap();
        assert!(event.flags.has("miss"));
        assert_eq!(event.flags.get("miss"), None);
    }

    #[test]
    fn test_parse_of_flag() {
        let event = parse_event("|-damage|p1a: Pikachu|70/100|[from] item: Rocky Helmet|[of] p2a: Ferrothorn")
            .unwrap()
            .unwrap();
        assert_eq!(
            event.flags.of(),
            Some(PokemonIdent::new(Player::P2, Some('a'), "Ferrothorn"))
        );
    }

    #[test]
    fn test_parse_boost() {
        let event = parse_event("|-unboost|p2a: Snorlax|atk|1").unwrap().unwrap();
        assert_eq!(
            event.kind,
            EventKind::Unboost {
                pokemon: PokemonIdent::new(Player::P2, Some('a'), "Snorlax"),
                stat: Stat::Atk,
                amount: 1,
            }
        );
    }

    #[test]
    fn test_parse_error_keeps_brackets() {
        let event = parse_event("|error|[Invalid choice] There's nothing to choose")
            .unwrap()
            .unwrap();
        assert_eq!(
            event.kind,
            EventKind::Error("[Invalid choice] There's nothing to choose".to_string())
        );
        assert!(event.flags.is_empty());
    }

    #[test]
    fn test_parse_empty_request() {
        let event = parse_event("|request|").unwrap().unwrap();
        assert_eq!(event.kind, EventKind::Request(None));
    }

    #[test]
    fn test_parse_request() {
        let event = parse_event(r#"|request|{"wait":true,"rqid":4}"#)
            .unwrap()
            .unwrap();
        match event.kind {
            EventKind::Request(Some(req)) => {
                assert!(req.wait);
                assert_eq!(req.rqid, Some(4));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_event("|turn|abc").is_err());
        assert!(parse_event("|switch|nobody").is_err());
        assert!(parse_event("|request|{not json").is_err());
    }

    #[test]
    fn test_parse_unknown() {
        let event = parse_event("|j|☆someone").unwrap().unwrap();
        assert_eq!(
            event.kind,
            EventKind::Other {
                tag: "j".to_string(),
                args: vec!["☆someone".to_string()],
            }
        );
    }

    #[test]
    fn test_brackets_outside_actions_are_not_flags() {
        let event = parse_event("|tier|[Gen 3] OU").unwrap().unwrap();
        assert_eq!(event.kind, EventKind::Tier("[Gen 3] OU".to_string()));
        assert!(!event.flags.has("Gen 3"));
    }

    #[test]
    fn test_parse_raw_lines() {
        assert_eq!(parse_event("").unwrap(), None);
        assert_eq!(parse_event("|").unwrap(), None);
        assert_eq!(parse_event("some raw text").unwrap(), None);
    }

    #[test]
    fn test_parse_block() {
        let block = ">battle-gen4randombattle-1\n|\n|t:|1700000000\n|move|p1a: Pikachu|Thunderbolt|p2a: Gyarados\n|-damage|p2a: Gyarados|20/100\n|turn|2";
        let events = parse_block(block).unwrap();
        let tags: Vec<EventTag> = events.iter().map(|e| e.tag()).collect();

        assert_eq!(
            tags,
            vec![
                EventTag::Other,
                EventTag::Move,
                EventTag::Damage,
                EventTag::Turn
            ]
        );
        assert_eq!(crate::block_room_id(block), Some("battle-gen4randombattle-1"));
    }
}
