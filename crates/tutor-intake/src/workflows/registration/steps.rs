use serde::Serialize;

use super::domain::SubjectRole;

pub const STUDENT_TYPES: &[&str] = &["STUDENT", "PARENT"];
pub const SKILL_LEVELS: &[&str] = &["BEGINNER", "INTERMEDIATE", "ADVANCED"];
pub const LESSON_FORMATS: &[&str] = &["ONLINE", "IN_PERSON", "EITHER"];
pub const AVAILABILITY_SLOTS: &[&str] = &[
    "WEEKDAY_MORNING",
    "WEEKDAY_AFTERNOON",
    "WEEKDAY_EVENING",
    "WEEKEND",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    SingleSelect,
    MultiSelect,
    FreeText,
    Numeric,
}

/// Where the valid values for a select field come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OptionSource {
    Unconstrained,
    Static {
        values: &'static [&'static str],
    },
    /// Resolved from the option catalog. With `depends_on`, the universe is the
    /// set of children of whatever was selected in that earlier field.
    Catalog {
        depends_on: Option<&'static str>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub options: OptionSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDefinition {
    pub step_number: u32,
    pub title: &'static str,
    pub fields: Vec<FieldSpec>,
}

impl StepDefinition {
    pub fn required_fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn catalog_fields(&self) -> impl Iterator<Item = &FieldSpec> + '_ {
        self.fields
            .iter()
            .filter(|field| matches!(field.options, OptionSource::Catalog { .. }))
    }
}

/// Ordered step definitions for one registration form.
#[derive(Debug)]
pub struct RegistrationBlueprint {
    role: SubjectRole,
    steps: Vec<StepDefinition>,
}

impl RegistrationBlueprint {
    pub fn for_role(role: SubjectRole) -> Self {
        match role {
            SubjectRole::Student => Self::student_intake(),
            SubjectRole::Teacher => Self::teacher_registration(),
        }
    }

    pub fn student_intake() -> Self {
        Self {
            role: SubjectRole::Student,
            steps: student_steps(),
        }
    }

    pub fn teacher_registration() -> Self {
        Self {
            role: SubjectRole::Teacher,
            steps: teacher_steps(),
        }
    }

    pub fn role(&self) -> SubjectRole {
        self.role
    }

    pub fn total_steps(&self) -> u32 {
        self.steps.len() as u32
    }

    pub fn step(&self, step_number: u32) -> Option<&StepDefinition> {
        self.steps
            .iter()
            .find(|step| step.step_number == step_number)
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }
}

fn field(name: &'static str, kind: FieldKind, options: OptionSource) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
        options,
    }
}

fn optional(spec: FieldSpec) -> FieldSpec {
    FieldSpec {
        required: false,
        ..spec
    }
}

fn text(name: &'static str) -> FieldSpec {
    field(name, FieldKind::FreeText, OptionSource::Unconstrained)
}

fn numeric(name: &'static str) -> FieldSpec {
    field(name, FieldKind::Numeric, OptionSource::Unconstrained)
}

fn step(step_number: u32, title: &'static str, fields: Vec<FieldSpec>) -> StepDefinition {
    StepDefinition {
        step_number,
        title,
        fields,
    }
}

fn student_steps() -> Vec<StepDefinition> {
    vec![
        step(
            1,
            "Who is the learner?",
            vec![field(
                "studentType",
                FieldKind::SingleSelect,
                OptionSource::Static {
                    values: STUDENT_TYPES,
                },
            )],
        ),
        step(
            2,
            "Pick a category",
            vec![field(
                "category",
                FieldKind::SingleSelect,
                OptionSource::Catalog { depends_on: None },
            )],
        ),
        step(
            3,
            "Narrow it down",
            vec![field(
                "subcategories",
                FieldKind::MultiSelect,
                OptionSource::Catalog {
                    depends_on: Some("category"),
                },
            )],
        ),
        step(
            4,
            "Current level",
            vec![field(
                "level",
                FieldKind::SingleSelect,
                OptionSource::Static {
                    values: SKILL_LEVELS,
                },
            )],
        ),
        step(5, "Learning goals", vec![text("goals")]),
        step(
            6,
            "Lesson format",
            vec![field(
                "lessonFormat",
                FieldKind::SingleSelect,
                OptionSource::Static {
                    values: LESSON_FORMATS,
                },
            )],
        ),
        step(
            7,
            "Availability",
            vec![field(
                "availability",
                FieldKind::MultiSelect,
                OptionSource::Static {
                    values: AVAILABILITY_SLOTS,
                },
            )],
        ),
        step(8, "Budget per lesson", vec![numeric("budget")]),
        step(
            9,
            "About you",
            vec![text("fullName"), optional(text("city"))],
        ),
        step(10, "Contact details", vec![text("phone")]),
    ]
}

fn teacher_steps() -> Vec<StepDefinition> {
    vec![
        step(1, "Your name", vec![text("fullName")]),
        step(
            2,
            "What do you teach?",
            vec![field(
                "selectedRoles",
                FieldKind::MultiSelect,
                OptionSource::Catalog { depends_on: None },
            )],
        ),
        step(
            3,
            "Specialties",
            vec![field(
                "subOptions",
                FieldKind::MultiSelect,
                OptionSource::Catalog {
                    depends_on: Some("selectedRoles"),
                },
            )],
        ),
        step(
            4,
            "Focus areas",
            vec![field(
                "deepOptions",
                FieldKind::MultiSelect,
                OptionSource::Catalog {
                    depends_on: Some("subOptions"),
                },
            )],
        ),
        step(5, "Experience", vec![numeric("experienceYears")]),
        step(6, "Introduce yourself", vec![text("bio")]),
        step(7, "Hourly rate", vec![numeric("hourlyRate")]),
        step(
            8,
            "Lesson format",
            vec![field(
                "lessonFormat",
                FieldKind::SingleSelect,
                OptionSource::Static {
                    values: LESSON_FORMATS,
                },
            )],
        ),
    ]
}
