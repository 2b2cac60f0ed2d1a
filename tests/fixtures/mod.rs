//! Test fixtures for end-to-end resolution tests
//!
//! A [`TestProject`] is a throwaway project directory with a `project.toml`
//! and a `models/` tree. The YAML documents below are shared by the
//! integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use semantic_manifest::pipeline::Reparser;
use semantic_manifest::{Manifest, Result};
use tempfile::TempDir;

pub const SEMANTIC_PEOPLE_YML: &str = r#"
semantic_models:
  - name: semantic_people
    model: ref('people')
    dimensions:
      - name: favorite_color
        type: categorical
      - name: created_at
        type: time
        type_params:
          time_granularity: day
    measures:
      - name: years_tenure
        agg: sum
        expr: tenure
      - name: people
        agg: count
        expr: id
    entities:
      - name: id
        type: primary
    defaults:
      agg_time_dimension: created_at
"#;

pub const DISABLED_SEMANTIC_PEOPLE_YML: &str = r#"
semantic_models:
  - name: semantic_people
    model: ref('people')
    config:
      enabled: false
    dimensions:
      - name: favorite_color
        type: categorical
      - name: created_at
        type: time
        type_params:
          time_granularity: day
    measures:
      - name: years_tenure
        agg: sum
        expr: tenure
      - name: people
        agg: count
        expr: id
    entities:
      - name: id
        type: primary
    defaults:
      agg_time_dimension: created_at
"#;

pub const ENABLED_SEMANTIC_PEOPLE_YML: &str = r#"
semantic_models:
  - name: semantic_people
    model: ref('people')
    config:
      enabled: true
      group: some_group
      meta:
        my_meta: testing
        my_other_meta: testing more
    dimensions:
      - name: favorite_color
        type: categorical
      - name: created_at
        type: time
        type_params:
          time_granularity: day
    measures:
      - name: years_tenure
        agg: sum
        expr: tenure
      - name: people
        agg: count
        expr: id
    entities:
      - name: id
        type: primary
    defaults:
      agg_time_dimension: created_at
"#;

pub const COMPONENT_META_YML: &str = r#"
semantic_models:
  - name: semantic_people
    model: ref('people')
    dimensions:
      - name: favorite_color
        type: categorical
        config:
          meta:
            dimension: one
      - name: created_at
        type: time
        type_params:
          time_granularity: day
    measures:
      - name: years_tenure
        agg: sum
        expr: tenure
        config:
          meta:
            measure: two
      - name: people
        agg: count
        expr: id
    entities:
      - name: id
        type: primary
        config:
          meta:
            entity: three
    defaults:
      agg_time_dimension: created_at
"#;

pub const META_CLOBBERING_YML: &str = r#"
semantic_models:
  - name: semantic_people
    model: ref('people')
    config:
      meta:
        model_level: should_be_inherited
        component_level: should_be_overridden
    dimensions:
      - name: favorite_color
        type: categorical
        config:
          meta:
            component_level: dimension_override
      - name: created_at
        type: time
        type_params:
          time_granularity: day
    measures:
      - name: years_tenure
        agg: sum
        expr: tenure
        config:
          meta:
            component_level: measure_override
      - name: people
        agg: count
        expr: id
    entities:
      - name: id
        type: primary
        config:
          meta:
            component_level: entity_override
    defaults:
      agg_time_dimension: created_at
"#;

pub const PEOPLE_METRICS_YML: &str = r#"
metrics:
  - name: number_of_people
    label: "Number of people"
    description: Total count of people
    type: simple
    type_params:
      measure: people
    meta:
      my_meta: testing
  - name: total_tenure
    label: "Total tenure"
    description: Total number of years of team experience
    type: simple
    type_params:
      measure:
        name: years_tenure
    filter: "{{ Dimension('id__loves_dbt') }} is true"
"#;

pub const DISABLED_PEOPLE_METRICS_YML: &str = r#"
metrics:
  - name: number_of_people
    label: "Number of people"
    type: simple
    type_params:
      measure: people
    config:
      enabled: false
  - name: total_tenure
    label: "Total tenure"
    type: simple
    type_params:
      measure:
        name: years_tenure
    config:
      enabled: false
"#;

pub const GROUPS_YML: &str = r#"
groups:
  - name: some_group
    owner:
      email: me@gmail.com
  - name: some_other_group
    owner:
      email: me@gmail.com
"#;

/// A project on disk, removed when dropped
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    /// Project named `test` with the given documents under `models/`
    pub fn new(models: &[(&str, &str)]) -> Self {
        let project = Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        };
        project.write_project("name = \"test\"\n");
        for (name, contents) in models {
            project.write_model(name, contents);
        }
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Replace `project.toml`
    pub fn write_project(&self, contents: &str) {
        fs::write(self.root().join("project.toml"), contents).expect("write project.toml");
    }

    /// Write a document relative to `models/`
    pub fn write_model(&self, relative: &str, contents: &str) {
        let path = self.root().join("models").join(relative);
        fs::create_dir_all(path.parent().expect("parent")).expect("create model dir");
        fs::write(path, contents).expect("write model");
    }

    pub fn remove_model(&self, relative: &str) {
        fs::remove_file(self.root().join("models").join(relative)).expect("remove model");
    }

    /// Run a full resolution pass
    pub fn parse(&self) -> Result<Manifest> {
        semantic_manifest::parse_project(self.root())
    }

    pub fn reparser(&self) -> Reparser {
        Reparser::new(self.root())
    }
}

/// The standard people project: model, metrics and groups
pub fn people_project(semantic_models: &str, metrics: &str) -> TestProject {
    TestProject::new(&[
        ("semantic_models.yml", semantic_models),
        ("people_metrics.yml", metrics),
        ("groups.yml", GROUPS_YML),
    ])
}

pub const SEMANTIC_PEOPLE_ID: &str = "semantic_model.test.semantic_people";
