use serde::{Deserialize, Serialize};

use super::{SceneError, SceneObject};

/// Value snapshot of a scene: full object list plus the identity counter.
///
/// Used for persistence and as the undo/redo value type. JSON form:
///
/// ```json
/// { "nextIdentity": 2,
///   "objects": [ { "id": 0, "position": [10.0, 20.0], "rotation": 0.0,
///                  "scale": [1.0, 1.0], "kind": "circle", "radius": 5.0 } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSnapshot {
    pub next_identity: u32,
    pub objects: Vec<SceneObject>,
}

impl SceneSnapshot {
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(data)?)
    }
}

#[cfg(test)]
mod tests {
    use glam::{Vec2, Vec4};

    use super::*;
    use crate::scene::{ObjectId, Shape};

    #[test]
    fn json_shape() {
        let snap = SceneSnapshot {
            next_identity: 1,
            objects: vec![SceneObject::rect(Vec2::new(1.5, 2.0), Vec2::new(3.0, 4.0)).with_id(ObjectId(0))],
        };
        let value: serde_json::Value = serde_json::from_str(&snap.to_json().unwrap()).unwrap();
        assert_eq!(value["nextIdentity"], 1);
        let obj = &value["objects"][0];
        assert_eq!(obj["kind"], "rect");
        assert_eq!(obj["id"], 0);
        assert_eq!(obj["position"], serde_json::json!([1.5, 2.0]));
        assert_eq!(obj["size"], serde_json::json!([3.0, 4.0]));
        assert_eq!(obj["scale"], serde_json::json!([1.0, 1.0]));
    }

    #[test]
    fn decodes_hand_written_blob() {
        let snap = SceneSnapshot::from_json(
            r#"{"nextIdentity":7,"objects":[
                {"id":3,"kind":"light","position":[5,6],"rotation":0,"scale":[1,1],"color":[2,1.5,1,1]}
            ]}"#,
        )
        .unwrap();
        assert_eq!(snap.next_identity, 7);
        assert_eq!(snap.objects[0].shape, Shape::Light { color: Vec4::new(2.0, 1.5, 1.0, 1.0) });
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let err = SceneSnapshot::from_json(
            r#"{"nextIdentity":0,"objects":[{"kind":"polygon","position":[0,0],"rotation":0,"scale":[1,1]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::Json(_)));
    }
}
