//! Constructor helpers for building expression trees.
//!
//! These wrap [`ExprTree::add`] with the slot layout each kind expects, so
//! callers (the parser, rules, tests) never lay out bindings by hand.

use common_error::SiftResult;
use sift_core::Value;

use crate::op::{AggFunc, ArithOp, CompareOp, ExprOp};
use crate::tree::{ExprId, ExprTree};
use crate::var::VarId;

impl ExprTree {
    /// A literal.
    pub fn constant(&mut self, value: impl Into<Value>) -> ExprId {
        self.leaf(ExprOp::Const(value.into()))
    }

    /// The literal `[]`.
    pub fn empty_array(&mut self) -> ExprId {
        self.constant(Value::empty_array())
    }

    /// A reference to `var`.
    pub fn var_ref(&mut self, var: VarId) -> ExprId {
        self.leaf(ExprOp::VarRef(var))
    }

    fn leaf(&mut self, op: ExprOp) -> ExprId {
        self.alloc(op, Vec::new())
    }

    /// Wrap a query root in the synthetic `Query` holder.
    pub fn query(&mut self, root: ExprId) -> SiftResult<ExprId> {
        self.add(ExprOp::Query, vec![root])
    }

    /// `$var = value`
    pub fn binding(&mut self, var: VarId, value: ExprId) -> SiftResult<ExprId> {
        self.add(ExprOp::Binding(var), vec![value])
    }

    /// `( stmt..., result )`
    pub fn do_block(&mut self, stmts: Vec<ExprId>, result: ExprId) -> SiftResult<ExprId> {
        let mut children = stmts;
        children.push(result);
        self.add(ExprOp::Do, children)
    }

    /// `input -> filter each $var (c1) and (c2) ...`
    pub fn filter(
        &mut self,
        var: VarId,
        input: ExprId,
        conjuncts: Vec<ExprId>,
    ) -> SiftResult<ExprId> {
        let binding = self.binding(var, input)?;
        let mut children = vec![binding];
        children.extend(conjuncts);
        self.add(ExprOp::Filter, children)
    }

    /// `input -> transform each $var projection`
    pub fn transform(&mut self, var: VarId, input: ExprId, projection: ExprId) -> SiftResult<ExprId> {
        let binding = self.binding(var, input)?;
        self.add(ExprOp::Transform, vec![binding, projection])
    }

    /// `for ($var in input) body`
    pub fn for_each(&mut self, var: VarId, input: ExprId, body: ExprId) -> SiftResult<ExprId> {
        let binding = self.binding(var, input)?;
        self.add(ExprOp::For, vec![binding, body])
    }

    /// `input -> group each $item by $key = key_expr as $into into collect`
    pub fn group_by(
        &mut self,
        item: VarId,
        input: ExprId,
        key: VarId,
        key_expr: ExprId,
        into: VarId,
        collect: ExprId,
    ) -> SiftResult<ExprId> {
        let item_binding = self.binding(item, input)?;
        let key_binding = self.binding(key, key_expr)?;
        self.add(
            ExprOp::GroupBy { into },
            vec![item_binding, key_binding, collect],
        )
    }

    /// A grouping whose aggregates are fed per item.
    ///
    /// Each accumulator `(var, func, per_item)` binds `var` to `func` applied to
    /// `per_item` evaluated for every item of the group.
    pub fn group_aggregate(
        &mut self,
        item: VarId,
        input: ExprId,
        key: VarId,
        key_expr: ExprId,
        accumulators: Vec<(VarId, AggFunc, ExprId)>,
        collect: ExprId,
    ) -> SiftResult<ExprId> {
        let item_binding = self.binding(item, input)?;
        let key_binding = self.binding(key, key_expr)?;
        let mut children = vec![item_binding, key_binding];
        for (var, func, per_item) in accumulators {
            children.push(self.accumulator(var, func, per_item)?);
        }
        children.push(collect);
        self.add(ExprOp::GroupAggregate, children)
    }

    /// `$var = func(per_item)` as an accumulator binding.
    pub fn accumulator(&mut self, var: VarId, func: AggFunc, per_item: ExprId) -> SiftResult<ExprId> {
        let acc = self.add(ExprOp::Accumulate(func), vec![per_item])?;
        self.binding(var, acc)
    }

    /// `(a and b ...)`
    pub fn and(&mut self, operands: Vec<ExprId>) -> SiftResult<ExprId> {
        self.add(ExprOp::And, operands)
    }

    /// `(a or b ...)`
    pub fn or(&mut self, operands: Vec<ExprId>) -> SiftResult<ExprId> {
        self.add(ExprOp::Or, operands)
    }

    /// `not e`
    pub fn not(&mut self, operand: ExprId) -> SiftResult<ExprId> {
        self.add(ExprOp::Not, vec![operand])
    }

    /// `(left op right)`
    pub fn compare(&mut self, op: CompareOp, left: ExprId, right: ExprId) -> SiftResult<ExprId> {
        self.add(ExprOp::Compare(op), vec![left, right])
    }

    /// `(left op right)`
    pub fn arith(&mut self, op: ArithOp, left: ExprId, right: ExprId) -> SiftResult<ExprId> {
        self.add(ExprOp::Arith(op), vec![left, right])
    }

    /// `if (cond) then_branch else else_branch`
    pub fn if_then(
        &mut self,
        cond: ExprId,
        then_branch: ExprId,
        else_branch: Option<ExprId>,
    ) -> SiftResult<ExprId> {
        self.add_slots(ExprOp::If, vec![Some(cond), Some(then_branch), else_branch])
    }

    /// `[item, ...]`
    pub fn array(&mut self, items: Vec<ExprId>) -> SiftResult<ExprId> {
        self.add(ExprOp::ArrayCons, items)
    }

    /// `{ name: value, ... }`
    pub fn record(&mut self, fields: Vec<(String, ExprId)>) -> SiftResult<ExprId> {
        let (names, values): (Vec<String>, Vec<ExprId>) = fields.into_iter().unzip();
        self.add(ExprOp::RecordCons(names), values)
    }

    /// `record.name`
    pub fn field(&mut self, record: ExprId, name: impl Into<String>) -> SiftResult<ExprId> {
        self.add(ExprOp::Field(name.into()), vec![record])
    }

    /// `func(array)`
    pub fn aggregate(&mut self, func: AggFunc, array: ExprId) -> SiftResult<ExprId> {
        self.add(ExprOp::Aggregate(func), vec![array])
    }

    /// `asArray(e)`
    pub fn as_array(&mut self, operand: ExprId) -> SiftResult<ExprId> {
        self.add(ExprOp::AsArray, vec![operand])
    }

    /// `emptyOnNull(e)`
    pub fn empty_on_null(&mut self, operand: ExprId) -> SiftResult<ExprId> {
        self.add(ExprOp::EmptyOnNull, vec![operand])
    }

    /// `name(arg, ...)`
    pub fn call(&mut self, name: impl Into<String>, args: Vec<ExprId>) -> SiftResult<ExprId> {
        self.add(ExprOp::Call(name.into()), args)
    }
}
