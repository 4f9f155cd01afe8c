use std::collections::HashSet;

use histquiz_game::{
    Choice, CorrectnessSet, EngineConfig, IdentityShuffler, Outcome, QuizError, ReferenceError,
    ScenarioData, ScenarioEngine, ScenarioNode, ScenarioStore, SeededShuffler, SessionStatus,
    is_correct_choice,
};

fn node(id: &str, choices: Vec<Choice>) -> ScenarioNode {
    ScenarioNode {
        id: id.to_string(),
        description: format!("Scene {id}"),
        choices,
    }
}

fn meiji_store() -> ScenarioStore {
    ScenarioStore::from_data(ScenarioData::from_nodes(vec![
        node(
            "start",
            vec![
                Choice::new("Sakamoto Ryoma", "n2", "sakamoto"),
                Choice::new("Katsu Kaishu", "n2", "katsu"),
                Choice::new("Silence", "n2", ""),
            ],
        ),
        node(
            "n2",
            vec![
                Choice::new("Iwakura Tomomi", "", "iwakura"),
                Choice::new("Ito Hirobumi", "", "ito"),
            ],
        ),
    ]))
    .unwrap()
}

fn engine_with(
    store: ScenarioStore,
    seed: u64,
) -> ScenarioEngine<CorrectnessSet, SeededShuffler> {
    ScenarioEngine::new(
        store,
        CorrectnessSet::default_allow_list(),
        SeededShuffler::new(seed),
        EngineConfig::default(),
    )
}

fn pick_by_text(
    engine: &mut ScenarioEngine<CorrectnessSet, SeededShuffler>,
    text: &str,
) -> histquiz_game::ChoiceRef {
    engine
        .present_node()
        .unwrap()
        .choices
        .into_iter()
        .find(|choice| choice.text == text)
        .map(|choice| choice.choice_ref)
        .unwrap()
}

#[test]
fn start_lands_on_start_node_when_present() {
    let mut engine = engine_with(meiji_store(), 1);
    let state = engine.start().unwrap();
    assert_eq!(state.current_node_id(), Some("start"));
    assert_eq!(state.status(), SessionStatus::InProgress);
}

#[test]
fn start_fails_without_start_node() {
    let store = ScenarioStore::from_data(ScenarioData::from_nodes(vec![node("n2", vec![])]))
        .unwrap();
    let mut engine = engine_with(store, 1);
    let err = engine.start().unwrap_err();
    assert!(matches!(err, QuizError::UnknownNode(ref missing) if missing.0 == "start"));
    assert_eq!(engine.status(), SessionStatus::NotStarted);
    assert!(engine.state().current_node_id().is_none());
}

#[test]
fn present_node_is_always_a_full_permutation() {
    let mut engine = engine_with(meiji_store(), 0xC0FFEE);
    engine.start().unwrap();
    let expected: HashSet<&str> = ["Sakamoto Ryoma", "Katsu Kaishu", "Silence"].into();
    let mut orders = HashSet::new();
    for _ in 0..50 {
        let view = engine.present_node().unwrap();
        assert_eq!(view.node_id, "start");
        assert_eq!(view.choices.len(), 3);
        let texts: Vec<&str> = view.choices.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts.iter().copied().collect::<HashSet<_>>(), expected);
        orders.insert(texts.join("|"));
    }
    assert!(orders.len() > 1, "shuffle should vary between calls");
}

#[test]
fn correctness_is_membership_of_non_blank_ids() {
    let set = CorrectnessSet::default_allow_list();
    for id in ["sakamoto", "satsucho", "saigo", "okubo", "iwakura", "restoration", "oath", "abolition"] {
        assert!(is_correct_choice(&set, id));
    }
    for id in ["", " ", "katsu", "ito", "SAKAMOTO"] {
        assert!(!is_correct_choice(&set, id));
    }
}

#[test]
fn sakamoto_continues_to_n2() {
    let mut engine = engine_with(meiji_store(), 5);
    engine.start().unwrap();
    let choice = pick_by_text(&mut engine, "Sakamoto Ryoma");
    let resolution = engine.resolve_choice(choice).unwrap();
    assert_eq!(
        resolution.outcome,
        Outcome::CorrectContinue {
            next_node_id: "n2".to_string()
        }
    );
    assert_eq!(engine.state().current_node_id(), Some("n2"));
    assert_eq!(engine.status(), SessionStatus::InProgress);
    assert!(resolution.pending.is_some());
}

#[test]
fn blank_semantic_id_is_game_over() {
    let mut engine = engine_with(meiji_store(), 5);
    engine.start().unwrap();
    let choice = pick_by_text(&mut engine, "Silence");
    let resolution = engine.resolve_choice(choice).unwrap();
    assert_eq!(resolution.outcome, Outcome::Incorrect);
    assert_eq!(engine.status(), SessionStatus::GameOver);
}

#[test]
fn iwakura_without_successor_is_game_clear() {
    let mut engine = engine_with(meiji_store(), 5);
    engine.start().unwrap();
    let first = pick_by_text(&mut engine, "Sakamoto Ryoma");
    engine.resolve_choice(first).unwrap();
    let last = pick_by_text(&mut engine, "Iwakura Tomomi");
    let resolution = engine.resolve_choice(last).unwrap();
    assert_eq!(resolution.outcome, Outcome::CorrectTerminal);
    assert_eq!(resolution.message, "Correct choice!\nGame clear!");
    assert!(resolution.pending.is_none());
    assert_eq!(engine.status(), SessionStatus::GameClear);
    assert_eq!(engine.state().history().len(), 2);
    assert_eq!(engine.state().correct_answers(), 2);
}

#[test]
fn terminal_states_reject_further_choices_without_mutation() {
    for (text, terminal) in [
        ("Katsu Kaishu", SessionStatus::GameOver),
        ("Sakamoto Ryoma", SessionStatus::GameClear),
    ] {
        let mut engine = engine_with(meiji_store(), 11);
        engine.start().unwrap();
        let first = pick_by_text(&mut engine, text);
        engine.resolve_choice(first).unwrap();
        if terminal == SessionStatus::GameClear {
            let last = pick_by_text(&mut engine, "Iwakura Tomomi");
            engine.resolve_choice(last).unwrap();
        }
        assert_eq!(engine.status(), terminal);
        let node_before = engine.state().current_node_id().map(str::to_string);

        for _ in 0..3 {
            let err = engine.resolve_choice(first).unwrap_err();
            assert!(matches!(err, QuizError::InvalidState { status } if status == terminal));
            assert_eq!(
                engine.state().current_node_id().map(str::to_string),
                node_before
            );
            assert!(engine.is_terminal());
        }
    }
}

#[test]
fn new_session_after_game_over_starts_fresh() {
    let mut engine = engine_with(meiji_store(), 3);
    engine.start().unwrap();
    let wrong = pick_by_text(&mut engine, "Katsu Kaishu");
    engine.resolve_choice(wrong).unwrap();
    assert!(engine.is_terminal());

    engine.start().unwrap();
    assert_eq!(engine.status(), SessionStatus::InProgress);
    assert_eq!(engine.state().current_node_id(), Some("start"));
    assert!(engine.state().history().is_empty());
}

#[test]
fn dangling_reference_is_detected_eagerly_and_lazily() {
    let store = ScenarioStore::from_data(ScenarioData::from_nodes(vec![node(
        "start",
        vec![Choice::new("Saigo Takamori", "edo", "saigo")],
    )]))
    .unwrap();
    let expected = ReferenceError {
        node_id: "start".to_string(),
        choice_index: 0,
        target: "edo".to_string(),
    };
    assert_eq!(store.validate_references().unwrap_err(), expected);

    let mut engine = ScenarioEngine::new(
        store,
        CorrectnessSet::default_allow_list(),
        IdentityShuffler,
        EngineConfig::default(),
    );
    engine.start().unwrap();
    let view = engine.present_node().unwrap();
    let err = engine.resolve_choice(view.choices[0].choice_ref).unwrap_err();
    assert!(matches!(err, QuizError::Reference(ref found) if *found == expected));
    assert_eq!(engine.state().current_node_id(), Some("start"));
}

#[test]
fn custom_predicate_replaces_the_allow_list() {
    let mut engine = ScenarioEngine::new(
        meiji_store(),
        |id: &str| id == "katsu",
        IdentityShuffler,
        EngineConfig::default(),
    );
    engine.start().unwrap();
    let view = engine.present_node().unwrap();
    let katsu = view
        .choices
        .iter()
        .find(|choice| choice.text == "Katsu Kaishu")
        .unwrap();
    assert!(engine.resolve_choice(katsu.choice_ref).unwrap().outcome.is_correct());
}
