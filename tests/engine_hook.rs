use zonewatch::scenario::ScenarioLoader;

#[test]
fn engine_runs_hook_each_tick() {
    let loader = ScenarioLoader::new(env!("CARGO_MANIFEST_DIR"));
    let scenario = loader
        .load("scenarios/lyon.yaml")
        .expect("scenario should load");
    let mut engine = scenario.build_engine(None).expect("engine builds");
    let mut dashboard = scenario
        .build_dashboard(engine.synchronizer())
        .expect("dashboard builds");

    let mut ticks = Vec::new();
    engine
        .run_with_hook(&mut dashboard, 6, |snapshot| {
            assert_eq!(snapshot.scenario, "lyon");
            assert_eq!(snapshot.readings.len(), 3);
            ticks.push(snapshot.tick)
        })
        .expect("run succeeds");

    assert_eq!(ticks.len(), 6);
    assert_eq!(ticks.first().copied(), Some(1));
    assert_eq!(ticks.last().copied(), Some(6));
    assert!(dashboard.updated_at().is_some());
}
