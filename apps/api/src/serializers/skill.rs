use serde_json::{json, Value};

use crate::models::skill::{SKILL_LEVEL_MAX, SKILL_LEVEL_MIN};
use crate::models::{Skill, SkillDraft};
use crate::serializers::{FieldErrors, FieldReader, Resource};

const NAME_MAX_LEN: usize = 100;

impl Resource for Skill {
    type Draft = SkillDraft;

    const NAME: &'static str = "skill";

    fn id(&self) -> i64 {
        self.id
    }

    fn decode(data: &Value) -> Result<SkillDraft, FieldErrors> {
        let mut r = FieldReader::new(data)?;
        let draft = SkillDraft {
            resume: r.primary_key("resume"),
            name: r.text("name", Some(NAME_MAX_LEN)),
            // bounded to 1..=5, so the narrowing cannot truncate
            level: r
                .nullable_integer("level", SKILL_LEVEL_MIN, SKILL_LEVEL_MAX)
                .map(|l| l as i32),
        };
        r.finish(draft)
    }

    fn encode(&self) -> Value {
        json!({
            "id": self.id,
            "resume": self.resume,
            "name": self.name,
            "level": self.level,
        })
    }

    fn to_draft(&self) -> SkillDraft {
        SkillDraft {
            resume: self.resume,
            name: self.name.clone(),
            level: self.level,
        }
    }
}
