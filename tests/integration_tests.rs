//! Whole-project scenarios run end to end through [`veriq::evaluate`].

#[cfg(test)]
mod integration_tests {
    use indexmap::IndexMap;
    use serde_json::json;

    use veriq::{EngineConfig, Path, PathPart, Project, ProjectPath, Reference, Schema, Scope};

    #[test]
    fn cross_scope_reference_and_verif_scheduling() {
        // Power::solar_heat -> {heat_generation: float}
        let mut power = Scope::new("Power");
        power
            .calculation(
                "solar_heat",
                Vec::new(),
                Vec::<String>::new(),
                Some(Schema::Record(vec![veriq::FieldSchema::new(
                    "heat_generation",
                    veriq::SchemaRef::immediate(Schema::Scalar),
                )])),
                |_args| Ok(json!({"heat_generation": 100.0})),
            )
            .unwrap();

        // Thermal::calculate_temperature(h: @solar_heat.heat_generation from Power)
        //   -> {temp_max: float} = h * 0.5
        let mut thermal = Scope::new("Thermal");
        thermal
            .calculation(
                "calculate_temperature",
                vec![(
                    "h",
                    Some(Reference::in_scope("@solar_heat.heat_generation", "Power")),
                )],
                vec!["Power"],
                Some(Schema::Record(vec![veriq::FieldSchema::new(
                    "temp_max",
                    veriq::SchemaRef::immediate(Schema::Scalar),
                )])),
                |args| {
                    let h = args[0].as_f64().unwrap();
                    Ok(json!({"temp_max": h * 0.5}))
                },
            )
            .unwrap();

        // Power::hot_enough reads Thermal::@calculate_temperature.temp_max,
        // returns v < 85.
        power
            .verification(
                "hot_enough",
                vec![(
                    "temp_max",
                    Some(Reference::in_scope(
                        "@calculate_temperature.temp_max",
                        "Thermal",
                    )),
                )],
                vec!["Thermal"],
                |args| {
                    let v = args[0].as_f64().unwrap();
                    Ok(json!(v < 85.0))
                },
            )
            .unwrap();

        let mut project = Project::new("Spacecraft");
        project.add_scope(power).unwrap();
        project.add_scope(thermal).unwrap();

        let model_data = IndexMap::new();
        let result = veriq::evaluate(&project, &model_data, &EngineConfig::default()).unwrap();

        let heat_generation = ProjectPath::new(
            "Power",
            Path::Calc {
                name: "solar_heat".into(),
                parts: smallvec::smallvec![PathPart::Attribute("heat_generation".into())],
            },
        );
        assert_eq!(result[&heat_generation], json!(100.0));

        let temp_max = ProjectPath::new(
            "Thermal",
            Path::Calc {
                name: "calculate_temperature".into(),
                parts: smallvec::smallvec![PathPart::Attribute("temp_max".into())],
            },
        );
        assert_eq!(result[&temp_max], json!(50.0));

        let hot_enough = ProjectPath::new(
            "Power",
            Path::Verif {
                name: "hot_enough".into(),
            },
        );
        assert_eq!(result[&hot_enough], json!(true));
    }

    #[test]
    fn registration_succeeds_but_evaluation_fails_on_a_cycle() {
        let mut scope = Scope::new("X");
        scope
            .calculation(
                "a",
                vec![("b", Some(Reference::new("@b")))],
                Vec::<String>::new(),
                Some(Schema::Scalar),
                |args| Ok(args[0].clone()),
            )
            .unwrap();
        scope
            .calculation(
                "b",
                vec![("a", Some(Reference::new("@a")))],
                Vec::<String>::new(),
                Some(Schema::Scalar),
                |args| Ok(args[0].clone()),
            )
            .unwrap();

        let mut project = Project::new("Cyclic");
        project.add_scope(scope).unwrap();

        let model_data = IndexMap::new();
        let err = veriq::evaluate(&project, &model_data, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, veriq::VeriqError::Cycle(_)));
    }

    #[test]
    fn unimported_cross_scope_reference_is_rejected_at_registration() {
        let mut scope = Scope::new("Thermal");
        let err = scope
            .calculation(
                "calculate_temperature",
                vec![(
                    "h",
                    Some(Reference::in_scope("@solar_heat.heat_generation", "Power")),
                )],
                Vec::<String>::new(), // no imports declared
                Some(Schema::Scalar),
                |args| Ok(args[0].clone()),
            )
            .unwrap_err();
        assert!(matches!(err, veriq::VeriqError::ScopeNotImported { .. }));
    }
}
