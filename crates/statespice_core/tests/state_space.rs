use ndarray::Array2;
use num_traits::{One, Zero};
use statespice_core::{
    AnalysisConfig, Circuit, Expr, InputSelection, MnaError, NumericCircuit, OutputSpec,
    ReductionError, StateSpaceModel, SwitchConfig, SwitchState, SymbolicCircuit,
};
use statespice_netlist::{Bindings, parse};

const SERIES_RLC: &str = "\
* series RLC driven by a voltage source
V1,1,0,Vs
R1,1,2,R
L1,2,3,L
C1,3,0,C
";

fn capacitor_output() -> AnalysisConfig {
    AnalysisConfig {
        outputs: vec![OutputSpec::NodeVoltage("3".to_string())],
        ..AnalysisConfig::default()
    }
}

fn numeric_model(
    netlist: &str,
    switches: &SwitchConfig,
    config: &AnalysisConfig,
) -> Result<StateSpaceModel<f64>, MnaError> {
    let netlist = parse(netlist).expect("netlist parses");
    let circuit: NumericCircuit = Circuit::assemble(&netlist, switches, config)?;
    circuit.state_space(config)
}

fn assert_close(actual: &Array2<f64>, expected: &[&[f64]]) {
    assert_eq!(actual.nrows(), expected.len(), "row count of {actual}");
    for (i, row) in expected.iter().enumerate() {
        assert_eq!(actual.ncols(), row.len(), "column count of {actual}");
        for (j, want) in row.iter().enumerate() {
            let got = actual[[i, j]];
            assert!(
                (got - want).abs() <= 1e-9 * want.abs().max(1.0),
                "entry ({i}, {j}) is {got}, expected {want}"
            );
        }
    }
}

#[test]
fn series_rlc_numeric() {
    let bindings: Bindings = [("Vs", 1.0), ("R", 2.0), ("L", 0.5), ("C", 0.25)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    let netlist = parse(SERIES_RLC).unwrap().bind(&bindings);
    let config = capacitor_output();
    let circuit: NumericCircuit =
        Circuit::assemble(&netlist, &SwitchConfig::new(), &config).unwrap();
    let model = circuit.state_space(&config).unwrap();

    assert_eq!(model.state_labels, ["I(L1)", "V(3)"]);
    assert_eq!(model.input_labels, ["V1"]);
    assert_eq!(model.output_labels, ["V(3)"]);
    assert_close(&model.a, &[&[-4.0, -2.0], &[4.0, 0.0]]);
    assert_close(&model.b, &[&[2.0], &[0.0]]);
    assert_close(&model.c, &[&[0.0, 1.0]]);
    assert_close(&model.d, &[&[0.0]]);
    assert!(model.drift.iter().all(|v| *v == 0.0));
    assert!(model.offset.iter().all(|v| *v == 0.0));
}

#[test]
fn series_rlc_symbolic() {
    let netlist = parse(SERIES_RLC).unwrap();
    let config = capacitor_output();
    let circuit: SymbolicCircuit =
        Circuit::assemble(&netlist, &SwitchConfig::new(), &config).unwrap();
    let model = circuit.state_space(&config).unwrap();

    let render = |m: &Array2<Expr>| -> Vec<Vec<String>> {
        m.rows()
            .into_iter()
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect()
    };
    insta::assert_debug_snapshot!(render(&model.a), @r#"
    [
        [
            "-R/L",
            "-1/L",
        ],
        [
            "1/C",
            "0",
        ],
    ]
    "#);
    assert_eq!(render(&model.b), [["1/L"], ["0"]]);
    assert_eq!(render(&model.c), [["0", "1"]]);
    assert_eq!(render(&model.d), [["0"]]);

    let (r, l, c) = (Expr::symbol("R"), Expr::symbol("L"), Expr::symbol("C"));
    assert_eq!(model.a[[0, 0]], -(r / l.clone()));
    assert_eq!(model.a[[1, 0]], Expr::one() / c);
    assert_eq!(model.b[[0, 0]], Expr::one() / l);
    assert!(model.a[[1, 1]].is_zero());
}

#[test]
fn symbolic_result_evaluates_to_numeric_result() {
    let bindings: Bindings = [("Vs", 1.0), ("R", 3.0), ("L", 2.0), ("C", 0.5)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    let netlist = parse(SERIES_RLC).unwrap();
    let config = capacitor_output();

    let symbolic: SymbolicCircuit =
        Circuit::assemble(&netlist, &SwitchConfig::new(), &config).unwrap();
    let symbolic = symbolic.state_space(&config).unwrap();
    let numeric = numeric_model(
        "V1,1,0,1\nR1,1,2,3\nL1,2,3,2\nC1,3,0,0.5\n",
        &SwitchConfig::new(),
        &config,
    )
    .unwrap();

    for ((i, j), expr) in symbolic.a.indexed_iter() {
        let value = expr.evaluate(&bindings).unwrap();
        assert!((value - numeric.a[[i, j]]).abs() < 1e-12, "A[{i},{j}]");
    }
}

#[test]
fn default_outputs_are_the_states() {
    let model = numeric_model(
        "V1,1,0,1\nR1,1,2,2\nL1,2,3,0.5\nC1,3,0,0.25\n",
        &SwitchConfig::new(),
        &AnalysisConfig::default(),
    )
    .unwrap();
    assert_eq!(model.output_labels, model.state_labels);
    assert_close(&model.c, &[&[1.0, 0.0], &[0.0, 1.0]]);
    assert_close(&model.d, &[&[0.0], &[0.0]]);
}

#[test]
fn rc_with_switch_in_both_states() {
    let netlist = "V1,1,0,1\nS1,1,2\nR1,2,3,2\nC1,3,0,0.25\n";

    let closed = numeric_model(
        netlist,
        &SwitchConfig::new().with("S1", SwitchState::Closed),
        &AnalysisConfig::default(),
    )
    .unwrap();
    assert_close(&closed.a, &[&[-2.0]]);
    assert_close(&closed.b, &[&[2.0]]);

    let open = numeric_model(
        netlist,
        &SwitchConfig::new().with("S1", SwitchState::Open),
        &AnalysisConfig::default(),
    )
    .unwrap();
    assert_close(&open.a, &[&[0.0]]);
    assert_close(&open.b, &[&[0.0]]);
}

#[test]
fn rc_with_closed_switch_symbolic() {
    let netlist = parse("V1,1,0,Vs\nS1,1,2\nR1,2,3,R\nC1,3,0,C\n").unwrap();
    let switches = SwitchConfig::new().with("S1", SwitchState::Closed);
    let config = AnalysisConfig::default();
    let circuit: SymbolicCircuit = Circuit::assemble(&netlist, &switches, &config).unwrap();
    let model = circuit.state_space(&config).unwrap();

    let rc = Expr::symbol("R") * Expr::symbol("C");
    assert_eq!(model.a[[0, 0]], -(Expr::one() / rc.clone()));
    assert_eq!(model.b[[0, 0]], Expr::one() / rc);
}

#[test]
fn open_switch_current_is_zero() {
    let config = AnalysisConfig {
        outputs: vec![
            OutputSpec::BranchCurrent("S1".to_string()),
            OutputSpec::VoltageAcross("1".to_string(), "2".to_string()),
        ],
        ..AnalysisConfig::default()
    };
    let model = numeric_model(
        "V1,1,0,1\nS1,1,2\nR1,2,0,1\n",
        &SwitchConfig::new().with("S1", SwitchState::Open),
        &config,
    )
    .unwrap();
    assert_eq!(model.state_count(), 0);
    assert_close(&model.d, &[&[0.0], &[1.0]]);
}

#[test]
fn current_source_feeds_through_to_output() {
    let config = AnalysisConfig {
        outputs: vec!["V(1)".parse().unwrap()],
        ..AnalysisConfig::default()
    };
    let model = numeric_model("I1,1,0,2\nR1,1,0,4\n", &SwitchConfig::new(), &config).unwrap();
    assert_eq!(model.a.dim(), (0, 0));
    assert_eq!(model.c.dim(), (1, 0));
    assert_close(&model.d, &[&[-4.0]]);
}

#[test]
fn unselected_sources_become_drift() {
    let config = AnalysisConfig {
        inputs: InputSelection::Named(vec!["v1".to_string()]),
        outputs: vec![OutputSpec::NodeVoltage("2".to_string())],
        ..AnalysisConfig::default()
    };
    let model = numeric_model(
        "V1,1,0,2\nR1,1,2,1\nC1,2,0,1\nI1,2,0,0.5\n",
        &SwitchConfig::new(),
        &config,
    )
    .unwrap();
    assert_eq!(model.input_labels, ["V1"]);
    assert_close(&model.a, &[&[-1.0]]);
    assert_close(&model.b, &[&[1.0]]);
    assert!((model.drift[0] + 0.5).abs() < 1e-12);
    assert_eq!(model.offset[0], 0.0);
}

#[test]
fn unknown_input_and_output_names() {
    let netlist = "V1,1,0,1\nR1,1,2,1\nC1,2,0,1\n";
    let config = AnalysisConfig {
        inputs: InputSelection::Named(vec!["V7".to_string()]),
        ..AnalysisConfig::default()
    };
    let err = numeric_model(netlist, &SwitchConfig::new(), &config).unwrap_err();
    assert!(matches!(
        err,
        MnaError::Reduction(ReductionError::UnknownInput { .. })
    ));

    let config = AnalysisConfig {
        outputs: vec![OutputSpec::NodeVoltage("9".to_string())],
        ..AnalysisConfig::default()
    };
    let err = numeric_model(netlist, &SwitchConfig::new(), &config).unwrap_err();
    assert!(matches!(
        err,
        MnaError::Reduction(ReductionError::UnknownOutput { .. })
    ));

    let config = AnalysisConfig {
        outputs: vec![OutputSpec::BranchCurrent("R1".to_string())],
        ..AnalysisConfig::default()
    };
    let err = numeric_model(netlist, &SwitchConfig::new(), &config).unwrap_err();
    assert!(matches!(
        err,
        MnaError::Reduction(ReductionError::UnknownOutput { .. })
    ));
}

#[test]
fn parallel_voltage_sources_are_singular() {
    let netlist = parse("V1,1,0,5\nV2,1,0,3\nR1,1,0,1\n").unwrap();
    let config = AnalysisConfig::default();
    let circuit: NumericCircuit =
        Circuit::assemble(&netlist, &SwitchConfig::new(), &config).unwrap();
    let err = circuit.state_space(&config).unwrap_err();
    assert!(matches!(
        err,
        MnaError::Reduction(ReductionError::SingularAlgebraicBlock { .. })
    ));
    // the assembled system is still there to inspect
    assert_eq!(circuit.system().dim(), 3);
}

#[test]
fn parallel_voltage_sources_are_singular_symbolically() {
    let netlist = parse("V1,1,0,Va\nV2,1,0,Vb\nR1,1,0,R\n").unwrap();
    let config = AnalysisConfig::default();
    let circuit: SymbolicCircuit =
        Circuit::assemble(&netlist, &SwitchConfig::new(), &config).unwrap();
    assert!(matches!(
        circuit.state_space(&config),
        Err(MnaError::Reduction(ReductionError::SingularAlgebraicBlock { .. }))
    ));
}

#[test]
fn capacitance_on_an_algebraic_unknown_is_rejected() {
    let err = numeric_model(
        "V1,1,0,1\nC1,1,0,1\nC2,1,2,1\nC3,2,0,-1\n",
        &SwitchConfig::new(),
        &AnalysisConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        MnaError::Reduction(ReductionError::AlgebraicCapacitance { .. })
    ));
}

#[test]
fn series_rlc_with_widely_spread_values() {
    let model = numeric_model(
        "V1,1,0,1\nR1,1,2,1\nL1,2,3,10\nC1,3,0,1p\n",
        &SwitchConfig::new(),
        &capacitor_output(),
    )
    .unwrap();
    assert_close(&model.a, &[&[-0.1, -0.1], &[1e12, 0.0]]);
    assert_close(&model.b, &[&[0.1], &[0.0]]);
    assert_close(&model.c, &[&[0.0, 1.0]]);
}

#[test]
fn node_held_by_a_huge_resistor() {
    let config = AnalysisConfig {
        outputs: vec![OutputSpec::NodeVoltage("3".to_string())],
        ..AnalysisConfig::default()
    };
    let model = numeric_model(
        "V1,1,0,1\nR1,1,2,1\nC1,2,0,1\nI1,3,0,1\nR2,3,0,10T\n",
        &SwitchConfig::new(),
        &config,
    )
    .unwrap();
    assert_eq!(model.input_labels, ["V1", "I1"]);
    assert_close(&model.a, &[&[-1.0]]);
    assert_close(&model.b, &[&[1.0, 0.0]]);
    assert_close(&model.c, &[&[0.0]]);
    assert_close(&model.d, &[&[0.0, -1e13]]);
}
