use std::borrow::Cow;

use serde::{
    de::{self, MapAccess, SeqAccess, Visitor},
    ser::SerializeStruct,
    Deserialize, Serialize,
};


/// A typed event describing an intended state change.
///
/// The engine never inspects the payload; `kind` exists for callers and for
/// diagnostics. Actions flow through the engine as `Rc<Action<P>>` so the
/// same instance a caller dispatched is the one observable on the applied
/// actions stream and in [`Transition`](crate::Transition) records.
pub struct Action<P> {
    pub kind: Cow<'static, str>,
    pub payload: P,
}

impl<P> Action<P> {
    pub fn new(kind: impl Into<Cow<'static, str>>, payload: P) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}
impl<P: Clone> Clone for Action<P> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            payload: self.payload.clone(),
        }
    }
}
impl<P: std::fmt::Debug> std::fmt::Debug for Action<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind)
            .field("payload", &self.payload)
            .finish()
    }
}

impl<P: Serialize> Serialize for Action<P> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        let mut s = serializer.serialize_struct("Action", 2)?;
        s.serialize_field("kind", &self.kind)?;
        s.serialize_field("payload", &self.payload)?;
        s.end()
    }
}
impl<'de, P> Deserialize<'de> for Action<P>
where
    P: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Action<P>, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        struct ActionVisitor<P>(std::marker::PhantomData<P>);
        impl<'de, P: Deserialize<'de>> Visitor<'de> for ActionVisitor<P> {
            type Value = Action<P>;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("struct Action")
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let kind: String = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let payload = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                Ok(Action::new(kind, payload))
            }
            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut kind: Option<String> = None;
                let mut payload: Option<P> = None;
                while let Some(key) = map.next_key::<Cow<str>>()? {
                    match &*key {
                        "kind" => {
                            if kind.is_some() {
                                return Err(de::Error::duplicate_field("kind"));
                            }
                            kind = Some(map.next_value()?);
                        }
                        "payload" => {
                            if payload.is_some() {
                                return Err(de::Error::duplicate_field("payload"));
                            }
                            payload = Some(map.next_value()?);
                        }
                        _ => return Err(de::Error::unknown_field(&key, &["kind", "payload"])),
                    }
                }
                let kind = kind.ok_or_else(|| de::Error::missing_field("kind"))?;
                let payload = payload.ok_or_else(|| de::Error::missing_field("payload"))?;
                Ok(Action::new(kind, payload))
            }
        }
        deserializer.deserialize_struct(
            "Action",
            &["kind", "payload"],
            ActionVisitor(std::marker::PhantomData),
        )
    }
}
