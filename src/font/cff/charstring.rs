use std::collections::{HashMap, VecDeque};

use crate::{
    error::{CffError, CffResult, Unsupported},
    geometry::{path_builder::PathBuilder, PathCommand},
    options::{DecodeOptions, TrailingOperands},
};

use super::{
    subrs::SubroutineTable,
    tokenizer::{CharStringTokenizer, Operator, Token},
};

/// Everything a glyph program may refer to outside of itself
#[derive(Debug, Clone, Copy)]
pub struct CharStringContext<'a> {
    pub global_subrs: &'a SubroutineTable,
    pub local_subrs: Option<&'a SubroutineTable>,
    pub nominal_width_x: f64,
    pub options: &'a DecodeOptions,
}

/// The result of running a glyph program
#[derive(Debug, Clone, PartialEq)]
pub struct CharStringOutline {
    pub width: f64,
    pub commands: Vec<PathCommand>,
}

/// Type 2 charstring interpreter
///
/// See <https://adobe-type-tools.github.io/font-tech-notes/pdfs/5177.Type2.pdf>
pub struct CffCharStringInterpreter<'a> {
    ctx: CharStringContext<'a>,
    program: CharStringTokenizer<'a>,
    /// Where to resume once the current subroutine returns
    call_stack: Vec<CharStringTokenizer<'a>>,
    operand_stack: VecDeque<f64>,
    transient_array: HashMap<i32, f64>,
    path_builder: PathBuilder,
    width: f64,
    first_stack_clearing_op: bool,

    hint_count: usize,
}

impl<'a> CffCharStringInterpreter<'a> {
    fn new(program: &'a [u8], ctx: CharStringContext<'a>) -> Self {
        Self {
            ctx,
            program: CharStringTokenizer::new(program),
            call_stack: Vec::new(),
            operand_stack: VecDeque::new(),
            transient_array: HashMap::new(),
            path_builder: PathBuilder::new(),
            width: ctx.nominal_width_x,
            first_stack_clearing_op: true,
            hint_count: 0,
        }
    }

    pub fn evaluate(
        program: &'a [u8],
        ctx: CharStringContext<'a>,
    ) -> CffResult<CharStringOutline> {
        let mut parser = Self::new(program, ctx);

        loop {
            let token = match parser.program.next_token()? {
                Some(token) => token,
                // running off the end of a subroutine returns from it
                None => match parser.call_stack.pop() {
                    Some(caller) => {
                        parser.program = caller;
                        continue;
                    }
                    None => {
                        anyhow::bail!(CffError::broken_glyph("charstring ended without endchar"))
                    }
                },
            };

            match token {
                Token::Integer(n) => parser.push(n as f64),
                Token::Fixed(n) => parser.push(n.to_num()),
                Token::Operator(op) => {
                    if parser.execute(op)? {
                        break;
                    }
                }
            }
        }

        Ok(CharStringOutline {
            width: parser.width,
            commands: parser.path_builder.into_commands(),
        })
    }

    /// Returns `true` once the glyph is finished
    fn execute(&mut self, op: Operator) -> CffResult<bool> {
        match op {
            // y dy {dya dyb}* hstem (1)
            Operator::HStem => self.stem(op)?,
            // x dx {dxa dxb}* vstem (3)
            Operator::VStem => self.stem(op)?,
            // dy1 vmoveto (4)
            Operator::VMoveTo => self.vmoveto()?,
            // {dxa dya}+ rlineto (5)
            Operator::RLineTo => self.rlineto()?,
            // dx1 {dya dxb}* hlineto (6)
            // {dxa dyb}+ hlineto (6)
            Operator::HLineTo => self.alternating_lines(op, true)?,
            // dy1 {dxa dyb}* vlineto (7)
            // {dya dxb}+ vlineto (7)
            Operator::VLineTo => self.alternating_lines(op, false)?,
            // {dxa dya dxb dyb dxc dyc}+ rrcurveto (8)
            Operator::RrCurveTo => self.rrcurveto()?,
            // subr# callsubr (10) –
            Operator::CallSubr => self.callsubr()?,
            // – return (11) –
            Operator::Return => self.return_from_subr()?,
            // – endchar (14)
            Operator::EndChar => {
                self.end_char()?;
                return Ok(true);
            }
            // y dy {dya dyb}* hstemhm (18)
            Operator::HStemHm => self.stem(op)?,
            // hintmask (19 + mask)
            Operator::HintMask => self.hintmask(op)?,
            // cntrmask (20 + mask)
            Operator::CntrMask => self.hintmask(op)?,
            // dx1 dy1 rmoveto (21)
            Operator::RMoveTo => self.rmoveto()?,
            // dx1 hmoveto (22)
            Operator::HMoveTo => self.hmoveto()?,
            // x dx {dxa dxb}* vstemhm (23)
            Operator::VStemHm => self.stem(op)?,
            // {dxa dya dxb dyb dxc dyc}+ dxd dyd rcurveline (24)
            Operator::RCurveLine => self.rcurveline()?,
            // {dxa dya}+ dxb dyb dxc dyc dxd dyd rlinecurve (25)
            Operator::RLineCurve => self.rlinecurve()?,
            // dx1? {dya dxb dyb dyc}+ vvcurveto (26)
            Operator::VvCurveTo => self.vvcurveto()?,
            // dy1? {dxa dxb dyb dxc}+ hhcurveto (27)
            Operator::HhCurveTo => self.hhcurveto()?,
            // globalsubr# callgsubr (29) –
            Operator::CallGsubr => self.callgsubr()?,
            // dy1 dx2 dy2 dx3 {dxa dxb dyb dyc dyd dxe dye dxf}* dyf? vhcurveto (30)
            // {dya dxb dyb dxc dxd dxe dye dyf}+ dxf? vhcurveto (30)
            Operator::VhCurveTo => self.alternating_curves(op, false)?,
            // dx1 dx2 dy2 dy3 {dya dxb dyb dxc dxd dxe dye dyf}* dxf? hvcurveto (31)
            // {dxa dxb dyb dyc dyd dxe dye dxf}+ dyf? hvcurveto (31)
            Operator::HvCurveTo => self.alternating_curves(op, true)?,

            // – dotsection (12 0) –
            Operator::DotSection => {}
            // num1 num2 and (12 3) 1_or_0
            Operator::And => {
                let (num1, num2) = self.pop2()?;
                self.push_bool(num1 != 0.0 && num2 != 0.0);
            }
            // num1 num2 or (12 4) 1_or_0
            Operator::Or => {
                let (num1, num2) = self.pop2()?;
                self.push_bool(num1 != 0.0 || num2 != 0.0);
            }
            // num1 not (12 5) 1_or_0
            Operator::Not => {
                let num1 = self.pop()?;
                self.push_bool(num1 == 0.0);
            }
            // num abs (12 9) num2
            Operator::Abs => {
                let num = self.pop()?;
                self.push(num.abs());
            }
            // num1 num2 add (12 10) sum
            Operator::Add => {
                let (num1, num2) = self.pop2()?;
                self.push(num1 + num2);
            }
            // num1 num2 sub (12 11) difference
            Operator::Sub => {
                let (num1, num2) = self.pop2()?;
                self.push(num1 - num2);
            }
            // num1 num2 div (12 12) quotient
            Operator::Div => {
                let (num1, num2) = self.pop2()?;
                anyhow::ensure!(num2 != 0.0, CffError::broken_glyph("division by zero"));
                self.push(num1 / num2);
            }
            // num neg (12 14) num2
            Operator::Neg => {
                let num = self.pop()?;
                self.push(-num);
            }
            // num1 num2 eq (12 15) 1_or_0
            Operator::Eq => {
                let (num1, num2) = self.pop2()?;
                self.push_bool(num1 == num2);
            }
            // num drop (12 18)
            Operator::Drop => {
                self.pop()?;
            }
            // val i put (12 20)
            Operator::Put => {
                let i = self.pop_index()?;
                let val = self.pop()?;
                self.transient_array.insert(i, val);
            }
            // i get (12 21) val
            Operator::Get => {
                let i = self.pop_index()?;
                let val = *self.transient_array.get(&i).ok_or_else(|| {
                    CffError::broken_glyph(format!("get of unset transient slot {}", i))
                })?;
                self.push(val);
            }
            // s1 s2 v1 v2 ifelse (12 22) s1_or_s2
            Operator::IfElse => {
                let (v1, v2) = self.pop2()?;
                let (s1, s2) = self.pop2()?;
                self.push(if v1 <= v2 { s1 } else { s2 });
            }
            // random (12 23) num2
            Operator::Random => anyhow::bail!(CffError::UnsupportedFeature(Unsupported::Random)),
            // num1 num2 mul (12 24) product
            Operator::Mul => {
                let (num1, num2) = self.pop2()?;
                self.push(num1 * num2);
            }
            // num sqrt (12 26) num2
            Operator::Sqrt => {
                let num = self.pop()?;
                anyhow::ensure!(
                    num >= 0.0,
                    CffError::broken_glyph(format!("square root of {}", num))
                );
                self.push(num.sqrt());
            }
            // any dup (12 27) any any
            Operator::Dup => {
                let any = self.pop()?;
                self.push(any);
                self.push(any);
            }
            // num1 num2 exch (12 28) num2 num1
            Operator::Exch => {
                let (num1, num2) = self.pop2()?;
                self.push(num2);
                self.push(num1);
            }
            // numX ... num0 i index (12 29) numX ... num0 numi
            Operator::Index => self.index()?,
            // num(N–1) ... num0 N J roll (12 30) num((J–1) mod N) ... num0
            // num(N–1) ... num(J mod N)
            Operator::Roll => self.roll()?,
            // dx1 dx2 dy2 dx3 dx4 dx5 dx6 hflex (12 34)
            Operator::HFlex => self.flex(op, 7, Unsupported::HFlex)?,
            // dx1 dy1 dx2 dy2 dx3 dy3 dx4 dy4 dx5 dy5 dx6 dy6 fd flex (12 35)
            Operator::Flex => self.flex(op, 13, Unsupported::Flex)?,
            // dx1 dy1 dx2 dy2 dx3 dx4 dx5 dy5 dx6 hflex1 (12 36)
            Operator::HFlex1 => self.flex(op, 9, Unsupported::HFlex1)?,
            // dx1 dy1 dx2 dy2 dx3 dy3 dx4 dy4 dx5 dy5 d6 flex1 (12 37)
            Operator::Flex1 => self.flex(op, 11, Unsupported::Flex1)?,
        }

        Ok(false)
    }

    /// The first stack-clearing operator may carry the advance width, as a
    /// difference from `nominalWidthX`, before its own operands
    fn maybe_calculate_width(&mut self, has_width: bool) -> CffResult<()> {
        if self.first_stack_clearing_op && has_width {
            let width = self.pop_front()?;
            self.width += width;
        }

        self.first_stack_clearing_op = false;

        Ok(())
    }

    fn push(&mut self, n: f64) {
        self.operand_stack.push_back(n);
    }

    fn push_bool(&mut self, b: bool) {
        self.push(if b { 1.0 } else { 0.0 });
    }

    fn pop(&mut self) -> CffResult<f64> {
        self.operand_stack
            .pop_back()
            .ok_or_else(|| CffError::broken_glyph("stack underflow").into())
    }

    /// Pops the top two operands, returning them in the order they were pushed
    fn pop2(&mut self) -> CffResult<(f64, f64)> {
        let num2 = self.pop()?;
        let num1 = self.pop()?;

        Ok((num1, num2))
    }

    fn pop_front(&mut self) -> CffResult<f64> {
        self.operand_stack
            .pop_front()
            .ok_or_else(|| CffError::broken_glyph("stack underflow").into())
    }

    fn pop_index(&mut self) -> CffResult<i32> {
        let n = self.pop()?;

        anyhow::ensure!(
            n.is_finite() && n.abs() <= i32::MAX as f64,
            CffError::broken_glyph(format!("{} is not an index", n))
        );

        Ok(n as i32)
    }

    fn expect_operands(&self, op: Operator, valid: bool) -> CffResult<()> {
        anyhow::ensure!(
            valid,
            CffError::broken_glyph(format!(
                "{} operands for {}",
                self.operand_stack.len(),
                op
            ))
        );

        Ok(())
    }

    /// Path construction is only valid inside a subpath started by a moveto
    fn expect_subpath(&self, op: Operator) -> CffResult<()> {
        anyhow::ensure!(
            self.path_builder.has_subpath(),
            CffError::broken_glyph(format!("{} before any moveto", op))
        );

        Ok(())
    }

    /// specifies one or more stem hints. This allows multiple pairs of
    /// numbers, limited by the stack depth, to be used as arguments to a
    /// single stem operator
    ///
    /// It is required that the stems are encoded in ascending order (defined by
    /// increasing bottom edge). The encoded values are all relative; in the
    /// first pair, y is relative to 0, and dy specifies the distance from y. The
    /// first value of each subsequent pair is relative to the last edge defined
    /// by the previous pair
    ///
    /// hstemhm (18) and vstemhm (23) have the same meaning as hstem (1) and
    /// vstem (3), except that they must be used in place of them if the
    /// charstring contains one or more hintmask operators
    ///
    /// Only the number of stems is kept, to size the hintmask data
    fn stem(&mut self, op: Operator) -> CffResult<()> {
        self.maybe_calculate_width(self.operand_stack.len() % 2 == 1)?;

        let n = self.operand_stack.len();
        self.expect_operands(op, n > 0 && n % 2 == 0)?;

        self.hint_count += n / 2;
        self.operand_stack.clear();

        Ok(())
    }

    /// specifies which hints are active and which are not active. If any hints
    /// overlap, hintmask must be used to establish a nonoverlapping subset of
    /// hints. hintmask may occur any number of times in a charstring. Path
    /// operators occurring after a hintmask are influenced by the new hint set,
    /// but the current point is not moved
    ///
    /// The number of data bytes following the operator is exactly the number
    /// needed, one bit per hint, to reference the number of stem hints
    /// declared at the beginning of the charstring program
    ///
    /// If hstem and vstem hints are both declared at the beginning of a
    /// charstring, and this sequence is followed directly by the hintmask or
    /// cntrmask operators, the vstem hint operator need not be included
    ///
    /// cntrmask shares the encoding of hintmask; it specifies the counter
    /// spaces to be controlled rather than the active hints
    fn hintmask(&mut self, op: Operator) -> CffResult<()> {
        self.maybe_calculate_width(self.operand_stack.len() % 2 == 1)?;

        let n = self.operand_stack.len();
        self.expect_operands(op, n % 2 == 0)?;

        self.hint_count += n / 2;
        self.operand_stack.clear();

        self.program.skip_mask((self.hint_count + 7) / 8)?;

        Ok(())
    }

    /// Checks the operand count of a flex operator, then reports it as
    /// unsupported
    fn flex(&mut self, op: Operator, arity: usize, feature: Unsupported) -> CffResult<()> {
        self.expect_operands(op, self.operand_stack.len() == arity)?;

        anyhow::bail!(CffError::UnsupportedFeature(feature))
    }

    /// Common to the moveto operators: consumes the optional width and checks
    /// exactly `arity` operands remain
    fn moveto_operands(&mut self, op: Operator, arity: usize) -> CffResult<()> {
        self.maybe_calculate_width(self.operand_stack.len() == arity + 1)?;
        self.expect_operands(op, self.operand_stack.len() == arity)
    }

    /// moves the current point dy1 units in the vertical direction
    fn vmoveto(&mut self) -> CffResult<()> {
        self.moveto_operands(Operator::VMoveTo, 1)?;

        let dy1 = self.pop_front()?;
        self.path_builder.relative_move_to(0.0, dy1);

        Ok(())
    }

    /// moves the current point dx1 units in the horizontal direction
    fn hmoveto(&mut self) -> CffResult<()> {
        self.moveto_operands(Operator::HMoveTo, 1)?;

        let dx1 = self.pop_front()?;
        self.path_builder.relative_move_to(dx1, 0.0);

        Ok(())
    }

    /// moves the current point to a position at the relative coordinates (dx1, dy1)
    fn rmoveto(&mut self) -> CffResult<()> {
        self.moveto_operands(Operator::RMoveTo, 2)?;

        let dx = self.pop_front()?;
        let dy = self.pop_front()?;
        self.path_builder.relative_move_to(dx, dy);

        Ok(())
    }

    /// appends a line from the current point to a position at the relative
    /// coordinates dxa, dya. Additional rlineto operations are performed for all
    /// subsequent argument pairs. The number of lines is determined from the
    /// number of arguments on the stack
    fn rlineto(&mut self) -> CffResult<()> {
        let op = Operator::RLineTo;
        self.expect_subpath(op)?;

        let n = self.operand_stack.len();
        self.expect_operands(op, n > 0 && n % 2 == 0)?;

        while !self.operand_stack.is_empty() {
            let dx = self.pop_front()?;
            let dy = self.pop_front()?;

            self.path_builder.relative_line_to(dx, dy);
        }

        Ok(())
    }

    /// hlineto appends a horizontal line of length dx1 to the current point,
    /// vlineto a vertical one. Each subsequent argument draws a line along the
    /// other axis, so the lines alternate. The number of lines is determined
    /// from the number of arguments on the stack
    fn alternating_lines(&mut self, op: Operator, mut horizontal: bool) -> CffResult<()> {
        self.expect_subpath(op)?;
        self.expect_operands(op, !self.operand_stack.is_empty())?;

        while let Some(d) = self.operand_stack.pop_front() {
            if horizontal {
                self.path_builder.horizontal_line_to(d);
            } else {
                self.path_builder.vertical_line_to(d);
            }

            horizontal = !horizontal;
        }

        Ok(())
    }

    /// appends a Bézier curve, defined by dxa...dyc, to the current point. For each
    /// subsequent set of six arguments, an additional curve is appended to the
    /// current point. The number of curve segments is determined from the number
    /// of arguments on the number stack and is limited only by the size of the
    /// number stack
    fn rrcurveto(&mut self) -> CffResult<()> {
        let op = Operator::RrCurveTo;
        self.expect_subpath(op)?;

        let n = self.operand_stack.len();
        self.expect_operands(op, n > 0 && n % 6 == 0)?;

        while !self.operand_stack.is_empty() {
            self.curve_from_stack()?;
        }

        Ok(())
    }

    fn curve_from_stack(&mut self) -> CffResult<()> {
        let dx1 = self.pop_front()?;
        let dy1 = self.pop_front()?;
        let dx2 = self.pop_front()?;
        let dy2 = self.pop_front()?;
        let dx3 = self.pop_front()?;
        let dy3 = self.pop_front()?;

        self.path_builder
            .relative_relative_curve_to(dx1, dy1, dx2, dy2, dx3, dy3);

        Ok(())
    }

    /// is equivalent to one rrcurveto for each set of six arguments dxa...dyc,
    /// followed by exactly one rlineto using the dxd, dyd arguments. The number
    /// of curves is determined from the count on the argument stack
    fn rcurveline(&mut self) -> CffResult<()> {
        let op = Operator::RCurveLine;
        self.expect_subpath(op)?;

        let n = self.operand_stack.len();
        self.expect_operands(op, n >= 8 && (n - 2) % 6 == 0)?;

        while self.operand_stack.len() > 2 {
            self.curve_from_stack()?;
        }

        let dx = self.pop_front()?;
        let dy = self.pop_front()?;
        self.path_builder.relative_line_to(dx, dy);

        Ok(())
    }

    /// is equivalent to one rlineto for each pair of arguments beyond the six
    /// arguments dxb...dyd needed for the one rrcurveto command. The number of
    /// lines is determined from the count of items on the argument stack
    fn rlinecurve(&mut self) -> CffResult<()> {
        let op = Operator::RLineCurve;
        self.expect_subpath(op)?;

        let n = self.operand_stack.len();
        self.expect_operands(op, n >= 8 && n % 2 == 0)?;

        while self.operand_stack.len() > 6 {
            let dx = self.pop_front()?;
            let dy = self.pop_front()?;

            self.path_builder.relative_line_to(dx, dy);
        }

        self.curve_from_stack()
    }

    /// appends one or more Bézier curves to the current point, alternating
    /// between a horizontal and a vertical starting tangent. hvcurveto starts
    /// horizontal, vhcurveto vertical
    ///
    /// Every curve ends perpendicular to its start, except that an odd final
    /// argument gives the last curve a free end
    fn alternating_curves(&mut self, op: Operator, mut horizontal: bool) -> CffResult<()> {
        self.expect_subpath(op)?;

        let n = self.operand_stack.len();
        self.expect_operands(op, n >= 4 && matches!(n % 8, 0 | 1 | 4 | 5))?;

        while self.operand_stack.len() >= 4 {
            let a = self.pop_front()?;
            let b = self.pop_front()?;
            let c = self.pop_front()?;
            let d = self.pop_front()?;

            let last = if self.operand_stack.len() == 1 {
                self.pop_front()?
            } else {
                0.0
            };

            if horizontal {
                self.path_builder
                    .relative_relative_curve_to(a, 0.0, b, c, last, d);
            } else {
                self.path_builder
                    .relative_relative_curve_to(0.0, a, b, c, d, last);
            }

            horizontal = !horizontal;
        }

        Ok(())
    }

    /// appends one or more curves to the current point. If the argument count is a
    /// multiple of four, the curve starts and ends vertical. If the argument
    /// count is odd, the first curve does not begin with a vertical tangent
    fn vvcurveto(&mut self) -> CffResult<()> {
        let op = Operator::VvCurveTo;
        self.expect_subpath(op)?;

        let n = self.operand_stack.len();
        self.expect_operands(op, n >= 4 && matches!(n % 4, 0 | 1))?;

        let mut dx1 = if n % 4 == 1 { self.pop_front()? } else { 0.0 };

        while !self.operand_stack.is_empty() {
            let dya = self.pop_front()?;
            let dxb = self.pop_front()?;
            let dyb = self.pop_front()?;
            let dyc = self.pop_front()?;

            self.path_builder
                .relative_relative_curve_to(dx1, dya, dxb, dyb, 0.0, dyc);

            dx1 = 0.0;
        }

        Ok(())
    }

    /// appends one or more Bézier curves, as described by the dxa...dxc set of
    /// arguments, to the current point. For each curve, if there are 4
    /// arguments, the curve starts and ends horizontal. The first curve need not
    /// start horizontal (the odd argument case). Note the argument order for the
    /// odd argument case
    fn hhcurveto(&mut self) -> CffResult<()> {
        let op = Operator::HhCurveTo;
        self.expect_subpath(op)?;

        let n = self.operand_stack.len();
        self.expect_operands(op, n >= 4 && matches!(n % 4, 0 | 1))?;

        let mut dy1 = if n % 4 == 1 { self.pop_front()? } else { 0.0 };

        while !self.operand_stack.is_empty() {
            let dxa = self.pop_front()?;
            let dxb = self.pop_front()?;
            let dyb = self.pop_front()?;
            let dxc = self.pop_front()?;

            self.path_builder
                .relative_relative_curve_to(dxa, dy1, dxb, dyb, dxc, 0.0);

            dy1 = 0.0;
        }

        Ok(())
    }

    /// Returns the i-th element of the stack, counting from the top, in place
    /// of `i`. A negative `i` is treated as 0
    fn index(&mut self) -> CffResult<()> {
        let i = self.pop_index()?.max(0) as usize;
        let len = self.operand_stack.len();

        anyhow::ensure!(
            i < len,
            CffError::broken_glyph(format!("index {} into a stack of {}", i, len))
        );

        let n = self.operand_stack[len - 1 - i];
        self.push(n);

        Ok(())
    }

    /// Performs a circular shift of the top N elements of the stack by J
    /// positions. A positive J moves elements towards the top of the stack
    fn roll(&mut self) -> CffResult<()> {
        let j = self.pop_index()?;
        let n = self.pop_index()?;
        let len = self.operand_stack.len();

        anyhow::ensure!(
            n >= 0 && n as usize <= len,
            CffError::broken_glyph(format!("roll of {} elements in a stack of {}", n, len))
        );

        if n > 0 {
            let shift = j.rem_euclid(n) as usize;
            self.operand_stack.make_contiguous()[len - n as usize..].rotate_right(shift);
        }

        Ok(())
    }

    /// calls a charstring subroutine with index subr# (actually the subr number plus
    /// the subroutine bias number) in the Subrs array. Each element of the Subrs
    /// array is a charstring encoded like any other charstring. Arguments pushed
    /// on the Type 2 argument stack prior to calling the subroutine, and results
    /// pushed on this stack by the subroutine, act according to the manner in
    /// which the subroutine is coded
    fn callsubr(&mut self) -> CffResult<()> {
        let subrs = self
            .ctx
            .local_subrs
            .ok_or_else(|| CffError::broken_glyph("callsubr without local subroutines"))?;

        self.call(subrs)
    }

    /// operates in the same manner as callsubr except that it calls a global
    /// subroutine
    fn callgsubr(&mut self) -> CffResult<()> {
        self.call(self.ctx.global_subrs)
    }

    fn call(&mut self, subrs: &'a SubroutineTable) -> CffResult<()> {
        let operand = self.pop()?;
        let program = subrs.get(operand)?;

        let max_depth = self.ctx.options.max_subr_depth;
        anyhow::ensure!(
            self.call_stack.len() < max_depth,
            CffError::broken_glyph(format!("subroutines nested deeper than {}", max_depth))
        );

        log::trace!(
            "calling subroutine {} at depth {}",
            operand as i64 + subrs.bias() as i64,
            self.call_stack.len() + 1
        );

        let caller = std::mem::replace(&mut self.program, CharStringTokenizer::new(program));
        self.call_stack.push(caller);

        Ok(())
    }

    /// returns from either a local or global charstring subroutine, and
    /// continues execution after the corresponding call(g)subr
    fn return_from_subr(&mut self) -> CffResult<()> {
        self.program = self
            .call_stack
            .pop()
            .ok_or_else(|| CffError::broken_glyph("return outside of a subroutine"))?;

        Ok(())
    }

    /// finishes a charstring outline definition, and must be the last operator in a
    /// character's outline
    fn end_char(&mut self) -> CffResult<()> {
        self.maybe_calculate_width(self.operand_stack.len() % 2 == 1)?;

        match self.operand_stack.len() {
            0 => {}
            // adx ady bchar achar endchar, the accented character form
            4 => anyhow::bail!(CffError::UnsupportedFeature(Unsupported::AccentedEndChar)),
            n => match self.ctx.options.trailing_operands {
                TrailingOperands::Ignore => {
                    log::warn!("ignoring {} operands left at endchar", n);
                    self.operand_stack.clear();
                }
                TrailingOperands::Reject => {
                    anyhow::bail!(CffError::broken_glyph(format!(
                        "{} operands left at endchar",
                        n
                    )))
                }
            },
        }

        self.path_builder.close_path();

        Ok(())
    }
}
