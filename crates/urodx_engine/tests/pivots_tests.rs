//! FindPivots over the built-in catalog graph.

use urodx_engine::{find_pivots, Catalog, NodeId, ProbabilityGraph};

fn graph() -> ProbabilityGraph {
    ProbabilityGraph::from_catalog(&Catalog::urology().unwrap()).unwrap()
}

fn symptom_ids(graph: &ProbabilityGraph) -> Vec<NodeId> {
    (0..graph.len())
        .map(NodeId)
        .filter(|&id| graph.node(id).is_symptom())
        .collect()
}

#[test]
fn working_set_contains_every_seed() {
    let graph = graph();
    let symptoms = symptom_ids(&graph);

    // singles, adjacent pairs, and everything at once
    let mut seed_sets: Vec<Vec<NodeId>> = symptoms.iter().map(|&s| vec![s]).collect();
    seed_sets.extend(symptoms.windows(2).map(|w| w.to_vec()));
    seed_sets.push(symptoms.clone());

    for seeds in seed_sets {
        let result = find_pivots(&graph, &seeds, 1.0, 3);
        for seed in &seeds {
            assert!(result.working_set.contains(seed));
        }
        for pivot in &result.pivots {
            assert!(seeds.contains(pivot));
        }
    }
}

#[test]
fn single_symptom_reaches_its_conditions() {
    let graph = graph();
    let seed = graph.find("pelvic_pain").unwrap();
    let result = find_pivots(&graph, &[seed], 1.0, 3);

    // pelvic pain feeds stones, interstitial cystitis and prostatitis
    let ids: Vec<&str> = result.working_set.iter().map(|&n| graph.node(n).id()).collect();
    assert_eq!(ids, vec!["pelvic_pain", "kidney_stones", "interstitial_cystitis", "prostatitis"]);
    assert!(result.truncated);
    assert_eq!(result.pivots, vec![seed]);
}

#[test]
fn tight_bound_keeps_only_seeds() {
    let graph = graph();
    let seed = graph.find("fever").unwrap();
    let result = find_pivots(&graph, &[seed], 0.5, 3);
    assert_eq!(result.working_set, vec![seed]);
    assert!(result.pivots.is_empty());
    assert!(!result.truncated);
}

#[test]
fn empty_seed_set_is_legal() {
    let result = find_pivots(&graph(), &[], 1.0, 3);
    assert!(result.pivots.is_empty());
    assert!(result.working_set.is_empty());
}
