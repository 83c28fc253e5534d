use crate::shape::Shape;

/// Input and output shapes of a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub source: Shape,
    pub target: Shape,
}

impl Signature {
    pub fn new(source: Shape, target: Shape) -> Self {
        Signature { source, target }
    }

    /// The unconstrained signature primitives start out with; the assembler
    /// designates concrete ones as it threads shapes through a query.
    pub fn unconstrained() -> Self {
        Signature {
            source: Shape::Any,
            target: Shape::Any,
        }
    }
}
