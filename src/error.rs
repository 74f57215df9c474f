//! Error taxonomy for tree construction, rewriting and lowering.
//!
//! Every usage error gets its own variant so callers can match on the exact
//! condition. Structural invariant violations are not represented here: they
//! panic at the point of detection.

use thiserror::Error;

use crate::tree::NodeType;
use crate::types::Type;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Which flavour of member a named lookup was searching for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Property,
    Field,
    PropertyOrField,
    Indexer,
    Constructor,
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MemberKind::Method => "method",
            MemberKind::Property => "property",
            MemberKind::Field => "field",
            MemberKind::PropertyOrField => "property or field",
            MemberKind::Indexer => "indexer",
            MemberKind::Constructor => "constructor",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum Error {
    // ── Operator resolution ──
    #[error("the binary operator {op:?} is not defined for the types '{left}' and '{right}'")]
    BinaryOperatorNotDefined {
        op: NodeType,
        left: Type,
        right: Type,
    },

    #[error("the unary operator {op:?} is not defined for the type '{operand}'")]
    UnaryOperatorNotDefined { op: NodeType, operand: Type },

    #[error("no coercion operator is defined between types '{from}' and '{to}'")]
    CoercionOperatorNotDefined { from: Type, to: Type },

    #[error("reference equality is not defined for the types '{left}' and '{right}'")]
    ReferenceEqualityNotDefined { left: Type, right: Type },

    #[error("the operands for operator {op:?} do not match the parameters of method '{method}'")]
    OperandTypesDoNotMatchParameters { op: NodeType, method: String },

    #[error("the return type of '{method}' does not match the conversion parameter type for {op:?}")]
    OverloadOperatorTypeDoesNotMatchConversionType { op: NodeType, method: String },

    #[error("a conversion lambda is not supported for arithmetic types")]
    ConversionIsNotSupportedForArithmeticTypes,

    #[error("user-defined operator method '{0}' must be static")]
    UserDefinedOperatorMustBeStatic(String),

    #[error("user-defined operator method '{0}' must not be void")]
    UserDefinedOperatorMustNotBeVoid(String),

    #[error("the user-defined operator '{method}' for {op:?} must have identical parameter and return types")]
    UserDefinedOpMustHaveConsistentTypes { op: NodeType, method: String },

    #[error("the user-defined operator '{method}' for {op:?} must return a type assignable to its operand")]
    UserDefinedOpMustHaveValidReturnType { op: NodeType, method: String },

    #[error("the declaring type of '{method}' must define op_True and op_False to be used in {op:?}")]
    LogicalOperatorMustHaveBooleanOperators { op: NodeType, method: String },

    #[error("{0:?} is not a binary operator")]
    UnhandledBinary(NodeType),

    #[error("{0:?} is not a unary operator")]
    UnhandledUnary(NodeType),

    // ── Arity ──
    #[error("incorrect number of arguments supplied for call to '{0}'")]
    IncorrectNumberOfMethodCallArguments(String),

    #[error("incorrect number of arguments supplied for lambda invocation")]
    IncorrectNumberOfLambdaArguments,

    #[error("incorrect number of parameters supplied for lambda declaration")]
    IncorrectNumberOfLambdaDeclarationParameters,

    #[error("incorrect number of arguments for constructor of '{0}'")]
    IncorrectNumberOfConstructorArguments(Type),

    #[error("incorrect number of indexes for array of rank {rank}")]
    IncorrectNumberOfIndexes { rank: usize },

    #[error("incorrect number of members for constructor of '{0}'")]
    IncorrectNumberOfMembersForGivenConstructor(Type),

    // ── Operand typing ──
    #[error("coalesce used with a non-nullable left operand of type '{0}'")]
    CoalesceUsedOnNonNullType(Type),

    #[error("argument types do not match")]
    ArgumentTypesMustMatch,

    #[error("argument must be boolean, found '{0}'")]
    ArgumentMustBeBoolean(Type),

    #[error("argument must be an array, found '{0}'")]
    ArgumentMustBeArray(Type),

    #[error("argument must be a single-dimensional array, found '{0}'")]
    ArgumentMustBeSingleDimensionalArray(Type),

    #[error("array index must be of type int, found '{0}'")]
    ArgumentMustBeArrayIndexType(Type),

    #[error("argument must be an integer type, found '{0}'")]
    ArgumentMustBeInteger(Type),

    #[error("argument cannot be of type void")]
    ArgumentCannotBeOfTypeVoid,

    #[error("argument must not have a value type, found '{0}'")]
    ArgumentMustNotHaveValueType(Type),

    #[error("expected a lambda expression, found {0:?}")]
    ArgumentMustBeLambda(NodeType),

    #[error("expected a parameter expression, found {0:?}")]
    ArgumentMustBeParameter(NodeType),

    #[error("expected a new expression, found {0:?}")]
    ArgumentMustBeNew(NodeType),

    #[error("constant of type '{value}' cannot be used for type '{ty}'")]
    ConstantTypeMismatch { value: Type, ty: Type },

    #[error("'{0}' is not a valid type for TypeAs; it must be a reference or nullable type")]
    IncorrectTypeForTypeAs(Type),

    #[error("cannot unbox '{from}' to '{to}'")]
    InvalidUnboxType { from: Type, to: Type },

    #[error("type '{0}' cannot be used here because it is a by-ref type")]
    TypeMustNotBeByRef(Type),

    // ── Readability / writability ──
    #[error("expression must be readable")]
    ExpressionMustBeReadable,

    #[error("expression must be writable")]
    ExpressionMustBeWritable,

    #[error("expression of type '{expression}' cannot be used for assignment to type '{target}'")]
    ExpressionTypeDoesNotMatchAssignment { expression: Type, target: Type },

    #[error("expression of type '{expression}' cannot be used for parameter of type '{parameter}'")]
    ExpressionTypeDoesNotMatchParameter { expression: Type, parameter: Type },

    #[error("expression of type '{expression}' cannot be used for parameter of type '{parameter}' of method '{method}'")]
    ExpressionTypeDoesNotMatchMethodParameter {
        expression: Type,
        parameter: Type,
        method: String,
    },

    #[error("expression of type '{expression}' cannot be used for constructor parameter of type '{parameter}'")]
    ExpressionTypeDoesNotMatchConstructorParameter { expression: Type, parameter: Type },

    #[error("expression of type '{expression}' cannot be used for return type '{ret}'")]
    ExpressionTypeDoesNotMatchReturn { expression: Type, ret: Type },

    #[error("expression of type '{expression}' cannot be used for label of type '{label}'")]
    ExpressionTypeDoesNotMatchLabel { expression: Type, label: Type },

    #[error("expression of type '{expression}' cannot initialize an array of '{element}'")]
    ExpressionTypeCannotInitializeArrayType { expression: Type, element: Type },

    #[error("expression of type '{0}' cannot be invoked")]
    ExpressionTypeNotInvocable(Type),

    // ── Scopes and lambdas ──
    #[error("found duplicate variable '{0}'")]
    DuplicateVariable(String),

    #[error("variable '{name}' of type '{ty}' must not be by-ref")]
    VariableMustNotBeByRef { name: String, ty: Type },

    #[error("a block must contain at least one expression")]
    EmptyBlock,

    #[error("lambda type must be a delegate type, found '{0}'")]
    LambdaTypeMustBeDelegate(Type),

    #[error("parameter of type '{parameter}' cannot be used for delegate parameter of type '{delegate_param}'")]
    ParameterNotValidForDelegate { parameter: Type, delegate_param: Type },

    // ── Labels ──
    #[error("type of a continue label must be void")]
    LabelTypeMustBeVoid,

    #[error("label of type '{0}' requires a value")]
    LabelMustBeVoidOrHaveExpression(Type),

    // ── Members ──
    #[error("static member '{0}' must not be given an instance")]
    StaticMemberWithInstance(String),

    #[error("instance member '{0}' requires an instance")]
    InstanceMemberWithoutInstance(String),

    #[error("instance of type '{instance}' is not valid for member '{member}'")]
    InstanceAndMemberTypeMismatch { member: String, instance: Type },

    #[error("no {kind} named '{name}' with matching arguments exists on type '{ty}'")]
    MemberNotFound {
        kind: MemberKind,
        name: String,
        ty: Type,
    },

    #[error("more than one {kind} named '{name}' on type '{ty}' is compatible with the supplied arguments")]
    AmbiguousMatch {
        kind: MemberKind,
        name: String,
        ty: Type,
    },

    #[error("property '{0}' has no getter")]
    PropertyDoesNotHaveGetter(String),

    #[error("property '{0}' has no setter")]
    PropertyDoesNotHaveSetter(String),

    #[error("property '{0}' has no accessors")]
    PropertyDoesNotHaveAccessor(String),

    #[error("property '{0}' is indexed and requires arguments")]
    PropertyRequiresArguments(String),

    #[error("type '{0}' does not have a parameterless constructor")]
    MissingDefaultConstructor(Type),

    #[error("cannot construct an instance of abstract or interface type '{0}'")]
    NonAbstractConstructorRequired(Type),

    #[error("'{member}' is not a member of type '{ty}'")]
    NotAMemberOfType { member: String, ty: Type },

    // ── Initializers ──
    #[error("element initializer method must be named 'Add', found '{0}'")]
    ElementInitializerMethodNotAdd(String),

    #[error("element initializer method '{0}' must have at least one parameter")]
    ElementInitializerMethodWithZeroArgs(String),

    #[error("element initializer method '{0}' must be an instance method")]
    ElementInitializerMethodStatic(String),

    #[error("element initializer method '{0}' must not take by-ref parameters")]
    ElementInitializerMethodNoRefParam(String),

    #[error("type '{0}' is not enumerable and cannot be list-initialized")]
    TypeNotEnumerable(Type),

    #[error("list initializers must contain at least one element")]
    ListInitializerWithZeroMembers,

    #[error("array bounds must contain at least one dimension")]
    BoundsCannotBeLessThanOne,

    // ── Switch ──
    #[error("a switch case must have at least one test value")]
    SwitchCaseWithoutTestValues,

    #[error("switch value of type '{0}' does not match the comparison method's first parameter")]
    SwitchValueTypeDoesNotMatchComparisonMethodParameter(Type),

    #[error("test value of type '{0}' does not match the comparison method's second parameter")]
    TestValueTypeDoesNotMatchComparisonMethodParameter(Type),

    #[error("switch comparison method '{0}' must return bool")]
    EqualityMustReturnBoolean(String),

    #[error("all test values of a switch must have the same type")]
    AllTestValuesMustHaveSameType,

    #[error("all case bodies of a switch must have the same type")]
    AllCaseBodiesMustHaveSameType,

    #[error("a switch of type '{0}' must have a default body")]
    DefaultBodyMustBeSupplied(Type),

    // ── Try ──
    #[error("a try expression must have a catch, finally or fault block")]
    TryMustHaveCatchFinallyOrFault,

    #[error("a fault block cannot be combined with catch or finally blocks")]
    FaultCannotHaveCatchOrFinally,

    #[error("the body of a catch block must have the same type as the body of the try")]
    BodyOfCatchMustHaveSameTypeAsBodyOfTry,

    #[error("catch variable of type '{variable}' does not match the caught type '{caught}'")]
    CatchVariableTypeMismatch { variable: Type, caught: Type },

    // ── Debug info ──
    #[error("debug info {what} must be at least 1, found {value}")]
    DebugInfoOutOfRange { what: &'static str, value: u32 },

    #[error("debug info start position must not be after the end position")]
    StartEndMustBeOrdered,

    // ── Rewriting and lowering ──
    #[error("when called from '{method}', rewriting a node of type '{ty}' must return a non-null value of the same node kind")]
    MustRewriteToSameNode { method: &'static str, ty: Type },

    #[error("rewriting child of type '{before}' to '{after}' from '{method}' changes its type")]
    MustRewriteChildToSameType {
        before: Type,
        after: Type,
        method: &'static str,
    },

    #[error("node of kind {0:?} must be reducible")]
    MustBeReducible(NodeType),

    #[error("node of kind {0:?} reduced to itself")]
    MustReduceToDifferent(NodeType),

    #[error("reduced node of type '{after}' is not compatible with the original type '{before}'")]
    ReducedNotCompatible { before: Type, after: Type },

    // ── Resources ──
    #[error("insufficient stack to continue traversal at depth {depth}")]
    StackExhausted { depth: usize },

    #[error("could not start a fresh traversal stack: {0}")]
    FreshStackUnavailable(String),
}

impl Error {
    /// True for resource exhaustion, which callers may retry on a larger stack.
    pub fn is_stack_exhausted(&self) -> bool {
        matches!(self, Error::StackExhausted { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_types() {
        let e = Error::BinaryOperatorNotDefined {
            op: NodeType::Add,
            left: Type::string(),
            right: Type::i32(),
        };
        assert_eq!(
            e.to_string(),
            "the binary operator Add is not defined for the types 'string' and 'int'"
        );
    }

    #[test]
    fn test_stack_exhausted_is_distinct() {
        assert!(Error::StackExhausted { depth: 3 }.is_stack_exhausted());
        assert!(!Error::EmptyBlock.is_stack_exhausted());
    }
}
