use serde::Serialize;

/// Element type declared on an input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Datatype {
    Bytes,
    Int64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TensorValue {
    Int64(i64),
    Bytes(String),
}

impl TensorValue {
    /// The datatype a well-formed tensor carrying this value declares.
    pub fn datatype(&self) -> Datatype {
        match self {
            TensorValue::Int64(_) => Datatype::Int64,
            TensorValue::Bytes(_) => Datatype::Bytes,
        }
    }
}

/// One named, single-element model input.
///
/// The public constructors derive `datatype` from the value, so a tensor
/// built through them always declares the type it actually carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputTensor {
    name: &'static str,
    shape: [usize; 1],
    datatype: Datatype,
    data: [TensorValue; 1],
}

impl InputTensor {
    pub fn new(name: &'static str, value: TensorValue) -> Self {
        Self {
            name,
            shape: [1],
            datatype: value.datatype(),
            data: [value],
        }
    }

    pub fn bytes(name: &'static str, value: impl Into<String>) -> Self {
        Self::new(name, TensorValue::Bytes(value.into()))
    }

    pub fn int64(name: &'static str, value: i64) -> Self {
        Self::new(name, TensorValue::Int64(value))
    }

    /// Builds a tensor whose declared datatype may disagree with its value.
    /// Only the smoke driver needs this, to provoke server-side rejections.
    pub(crate) fn mislabeled(name: &'static str, datatype: Datatype, value: TensorValue) -> Self {
        Self {
            name,
            shape: [1],
            datatype,
            data: [value],
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn value(&self) -> &TensorValue {
        &self.data[0]
    }

    pub fn is_well_typed(&self) -> bool {
        self.datatype == self.value().datatype()
    }
}
