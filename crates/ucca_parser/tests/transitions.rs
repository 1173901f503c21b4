//! End-to-end coverage of the transition engine: drive a [`State`] through a hand-verified
//! action sequence and check the resulting [`Passage`](ucca_parser::Passage) shape, rather than
//! round-tripping encode/decode.

use ucca_parser::{Action, ActionError, EdgeTag, GoldRef, Options, OutputTarget, ScriptedActions, State};

fn run(tokens: &[&[&str]], actions: Vec<Action>) -> State {
    let tokens: Vec<Vec<String>> = tokens
        .iter()
        .map(|p| p.iter().map(|s| s.to_string()).collect())
        .collect();
    let mut state = State::from_tokens(tokens, "t", Options::default(), None);
    let mut source = ScriptedActions(actions.into_iter());
    state.run(&mut source).expect("scripted actions must be valid");
    assert!(state.is_finished());
    state
}

#[test]
fn single_terminal_gets_a_structural_parent() {
    let state = run(
        &[&["a"]],
        vec![
            Action::Shift,
            Action::Node { tag: EdgeTag::Terminal, gold: None },
            Action::Reduce,
            Action::Shift,
            Action::RightEdge(EdgeTag::structural("X")),
            Action::Reduce,
            Action::Reduce,
            Action::Finish,
        ],
    );

    let (passage, warnings) = state.create_passage().expect("valid passage");
    assert!(warnings.is_empty());
    assert_eq!(passage.terminals.len(), 1);
    assert_eq!(passage.terminals[0].text, "a");

    let root_edges: Vec<_> = passage.outgoing(passage.root).collect();
    assert_eq!(root_edges.len(), 1);
    assert_eq!(root_edges[0].tag, EdgeTag::structural("X"));
    let OutputTarget::Node(parent) = root_edges[0].child else {
        panic!("root's only child must be a structural node");
    };

    let parent_edges: Vec<_> = passage.outgoing(parent).collect();
    assert_eq!(parent_edges.len(), 1);
    assert_eq!(parent_edges[0].tag, EdgeTag::Terminal);
    let OutputTarget::Terminal(term) = parent_edges[0].child else {
        panic!("the structural parent's only child must be the terminal");
    };
    assert_eq!(passage.terminal(term).text, "a");
}

#[test]
fn two_terminals_attach_under_one_parent() {
    let state = run(
        &[&["a", "b"]],
        vec![
            Action::Shift,
            Action::Node { tag: EdgeTag::Terminal, gold: None },
            Action::Reduce,
            Action::Shift,
            Action::RightEdge(EdgeTag::structural("X")),
            Action::Shift,
            Action::RightEdge(EdgeTag::Terminal),
            Action::Reduce,
            Action::Reduce,
            Action::Reduce,
            Action::Finish,
        ],
    );

    let (passage, _) = state.create_passage().expect("valid passage");
    let root_edges: Vec<_> = passage.outgoing(passage.root).collect();
    assert_eq!(root_edges.len(), 1);
    let OutputTarget::Node(parent) = root_edges[0].child else {
        panic!("root's only child must be a structural node");
    };

    let texts: Vec<&str> = passage
        .outgoing(parent)
        .map(|e| {
            let OutputTarget::Terminal(t) = e.child else {
                panic!("both of the parent's children must be terminals");
            };
            assert_eq!(e.tag, EdgeTag::Terminal);
            passage.terminal(t).text.as_str()
        })
        .collect();
    assert_eq!(texts, vec!["a", "b"]);
}

#[test]
fn a_fresh_node_inserted_while_an_earlier_one_sits_in_the_buffer_is_averaged_between_them() {
    let tokens = vec![vec!["a".to_string(), "b".to_string()]];
    let mut state = State::from_tokens(tokens, "t", Options::default(), None);
    let mut source = ScriptedActions(
        vec![
            Action::Shift,
            Action::Node { tag: EdgeTag::Terminal, gold: None },
        ]
        .into_iter(),
    );
    state.run(&mut source).unwrap();
    // stack: [root, a]   buffer: [p1, b]   (p1 the node just created above `a`)
    let a = state.terminals()[0];
    let p1 = state.node(a).incoming[0];

    // A second `Node` action on the same stack top sees `p1` sitting at the buffer head, a
    // non-terminal created earlier: its swap index must average between `a` and `p1`.
    let action = Action::Node { tag: EdgeTag::Terminal, gold: None };
    state.assert_valid(&action).unwrap();
    state.transition(&action).unwrap();

    let p1_node = state.edge(p1).parent;
    let p2 = state
        .node(a)
        .incoming
        .iter()
        .map(|&e| state.edge(e).parent)
        .find(|&n| n != p1_node)
        .expect("the second Node action created a second parent of `a`");

    assert_eq!(state.node(a).swap_index, 0.0);
    assert_eq!(state.node(p1_node).swap_index, p1_node.index() as f64);
    assert_eq!(
        state.node(p2).swap_index,
        (state.node(a).swap_index + state.node(p1_node).swap_index) / 2.0
    );
}

#[test]
fn swap_moves_the_intervening_node_back_to_the_buffer() {
    let tokens = vec![vec!["a".to_string(), "b".to_string(), "c".to_string()]];
    let mut state = State::from_tokens(tokens, "t", Options::default(), None);
    let mut source = ScriptedActions(
        vec![
            Action::Shift,
            Action::Node { tag: EdgeTag::Terminal, gold: None },
            Action::Reduce,
            Action::Shift,
            Action::Shift,
        ]
        .into_iter(),
    );
    state.run(&mut source).unwrap();
    assert_eq!(state.stack_depth(), 3);

    let swap = Action::Swap(1);
    state.assert_valid(&swap).unwrap();
    state.transition(&swap).unwrap();

    assert_eq!(state.stack_depth(), 2);
    assert_eq!(state.buffer_len(), 2);
}

#[test]
fn remote_edge_links_across_the_primary_tree_without_creating_a_cycle() {
    let state = run(
        &[&["a", "b"]],
        vec![
            Action::Shift,
            Action::Node { tag: EdgeTag::Terminal, gold: None },
            Action::Reduce,
            Action::Shift,
            Action::RightEdge(EdgeTag::structural("G1")),
            Action::Shift,
            Action::Node { tag: EdgeTag::Terminal, gold: None },
            Action::Reduce,
            Action::Shift,
            Action::RightEdge(EdgeTag::structural("G2")),
            Action::Swap(1),
            Action::RightRemote(EdgeTag::structural("R")),
            Action::Reduce,
            Action::Reduce,
            Action::Finish,
        ],
    );

    let (passage, _) = state.create_passage().expect("valid passage");

    let root_edges: Vec<_> = passage.outgoing(passage.root).collect();
    assert_eq!(root_edges.len(), 2, "root gets the primary child plus the remote edge");

    let primary = root_edges.iter().find(|e| !e.remote).expect("a primary root edge");
    assert_eq!(primary.tag, EdgeTag::structural("G1"));
    let remote = root_edges.iter().find(|e| e.remote).expect("a remote root edge");
    assert_eq!(remote.tag, EdgeTag::structural("R"));

    let OutputTarget::Node(p1) = primary.child else { panic!("p1 is structural") };
    let OutputTarget::Node(p2_via_remote) = remote.child else { panic!("p2 is structural") };

    let p1_edges: Vec<_> = passage.outgoing(p1).collect();
    assert_eq!(p1_edges.len(), 2, "p1 keeps its terminal child and its primary edge to p2");
    let OutputTarget::Node(p2_via_primary) = p1_edges
        .iter()
        .find(|e| e.tag == EdgeTag::structural("G2"))
        .expect("p1 -> p2 primary edge")
        .child
    else {
        panic!("p2 is structural");
    };
    assert_eq!(p2_via_primary, p2_via_remote, "both edges land on the same materialized p2");

    let p2_edges: Vec<_> = passage.outgoing(p2_via_primary).collect();
    assert_eq!(p2_edges.len(), 1);
    let OutputTarget::Terminal(b) = p2_edges[0].child else { panic!("p2's child is a terminal") };
    assert_eq!(passage.terminal(b).text, "b");
}

#[test]
fn linkage_node_registers_its_relation_and_arguments() {
    let state = run(
        &[&["r", "x", "y"]],
        vec![
            Action::Implicit { tag: EdgeTag::structural("Linkage"), gold: None },
            Action::Shift, // L
            Action::Shift, // r
            Action::Node { tag: EdgeTag::Terminal, gold: None }, // Pn -> r
            Action::Reduce, // pop r
            Action::Shift, // Pn
            Action::RightEdge(EdgeTag::LinkRelation), // L -> Pn
            Action::Swap(1), // L back to the buffer
            Action::RightEdge(EdgeTag::structural("P")), // root -> Pn
            Action::Reduce, // pop Pn
            Action::Shift, // L
            Action::Shift, // x
            Action::Node { tag: EdgeTag::Terminal, gold: None }, // An1 -> x
            Action::Reduce, // pop x
            Action::Shift, // An1
            Action::RightEdge(EdgeTag::LinkArgument), // L -> An1
            Action::Swap(1), // L back to the buffer
            Action::RightEdge(EdgeTag::structural("A")), // root -> An1
            Action::Reduce, // pop An1
            Action::Shift, // L
            Action::Shift, // y
            Action::Node { tag: EdgeTag::Terminal, gold: None }, // An2 -> y
            Action::Reduce, // pop y
            Action::Shift, // An2
            Action::RightEdge(EdgeTag::LinkArgument), // L -> An2
            Action::Swap(1), // L back to the buffer
            Action::RightEdge(EdgeTag::structural("A")), // root -> An2
            Action::Reduce, // pop An2
            Action::Shift, // L
            Action::Reduce, // pop L
            Action::Reduce, // pop root
            Action::Finish,
        ],
    );

    let (passage, warnings) = state.create_passage().expect("valid passage");
    assert!(warnings.is_empty(), "two arguments is enough to avoid the few-arguments warning");
    assert_eq!(passage.linkages.len(), 1);

    let linkage = &passage.linkages[0];
    assert_eq!(linkage.arguments.len(), 2);

    let text_of = |target: OutputTarget| -> &str {
        let OutputTarget::Node(n) = target else { panic!("relation/argument is structural") };
        let edge = passage.outgoing(n).next().expect("a relation/argument node has its own terminal child");
        let OutputTarget::Terminal(t) = edge.child else { panic!("leaf is a terminal") };
        passage.terminal(t).text.as_str()
    };

    assert_eq!(text_of(linkage.relation), "r");
    let mut arg_texts: Vec<&str> = linkage.arguments.iter().map(|&a| text_of(a)).collect();
    arg_texts.sort_unstable();
    assert_eq!(arg_texts, vec!["x", "y"]);
}

#[test]
fn shift_with_an_empty_buffer_is_rejected() {
    let tokens = vec![vec!["a".to_string()]];
    let mut state = State::from_tokens(tokens, "t", Options::default(), None);
    state.transition(&Action::Shift).unwrap();
    assert_eq!(state.assert_valid(&Action::Shift), Err(ActionError::EmptyBuffer));
    assert!(!state.is_valid(&Action::Shift));
}

#[test]
fn reducing_a_childless_root_is_rejected() {
    let tokens = vec![vec!["a".to_string()]];
    let state = State::from_tokens(tokens, "t", Options::default(), None);
    assert_eq!(state.assert_valid(&Action::Reduce), Err(ActionError::ReduceRootless));
}

#[test]
fn gold_ref_round_trips_through_a_node_action() {
    let tokens = vec![vec!["a".to_string()]];
    let mut state = State::from_tokens(tokens, "t", Options::default(), None);
    let action = Action::Node { tag: EdgeTag::Terminal, gold: Some(GoldRef(7)) };
    state.transition(&Action::Shift).unwrap();
    state.assert_valid(&action).unwrap();
    state.transition(&action).unwrap();
    let a = state.terminals()[0];
    let parent = state.edge(state.node(a).incoming[0]).parent;
    assert_eq!(state.node(parent).gold_id, Some(GoldRef(7)));
}
